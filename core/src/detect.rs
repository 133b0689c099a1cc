//! UI-facing source classification used to pick a player.

use serde::{Deserialize, Serialize};

use crate::classify::{SocialPlatform, SourceKind, StreamProtocol, classify};

/// Type of media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSourceType {
    YouTube,
    Vimeo,
    /// Plain video file
    Direct,
    /// HLS, DASH or RTMP stream
    Stream,
    /// Audio-only file
    Mp3,
    Adult,
    Social,
    Unsupported,
}

/// Adaptive streaming format of a `Stream` source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Hls,
    Dash,
}

/// Result of [`detect_video_source`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSourceInfo {
    #[serde(rename = "type")]
    pub source_type: VideoSourceType,
    pub platform: String,
    pub requires_web_view: bool,
    /// Set for adult sources regardless of membership tier
    pub requires_age_verification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<StreamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl VideoSourceInfo {
    fn new(source_type: VideoSourceType, platform: impl Into<String>) -> Self {
        Self {
            source_type,
            platform: platform.into(),
            requires_web_view: false,
            requires_age_verification: false,
            stream_type: None,
            video_id: None,
        }
    }

    fn web_view(mut self) -> Self {
        self.requires_web_view = true;
        self
    }

    fn with_video_id(mut self, video_id: Option<String>) -> Self {
        self.video_id = video_id;
        self
    }

    pub fn from_kind(kind: &SourceKind) -> Self {
        match kind {
            SourceKind::YouTube { video_id } => Self::new(VideoSourceType::YouTube, "youtube")
                .web_view()
                .with_video_id(video_id.clone()),
            SourceKind::Vimeo { video_id } => Self::new(VideoSourceType::Vimeo, "vimeo")
                .web_view()
                .with_video_id(video_id.clone()),
            SourceKind::Stream { protocol } => {
                let (platform, stream_type) = match protocol {
                    StreamProtocol::Hls => ("hls", Some(StreamType::Hls)),
                    StreamProtocol::Dash => ("dash", Some(StreamType::Dash)),
                    StreamProtocol::Rtmp => ("rtmp", None),
                };
                Self {
                    stream_type,
                    ..Self::new(VideoSourceType::Stream, platform)
                }
            }
            SourceKind::Audio { .. } => Self::new(VideoSourceType::Mp3, "audio"),
            SourceKind::VideoFile { .. } => Self::new(VideoSourceType::Direct, "direct"),
            SourceKind::Adult { platform } => Self {
                requires_age_verification: true,
                ..Self::new(VideoSourceType::Adult, platform.clone()).web_view()
            },
            SourceKind::Social { platform, video_id } => {
                Self::new(VideoSourceType::Social, platform.as_str())
                    .web_view()
                    .with_video_id(video_id.clone())
            }
            SourceKind::Unsupported { host } => Self::new(
                VideoSourceType::Unsupported,
                host.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.source_type != VideoSourceType::Unsupported
    }

    /// Social network for `Social` sources
    pub fn social_platform(&self) -> Option<SocialPlatform> {
        if self.source_type != VideoSourceType::Social {
            return None;
        }
        match self.platform.as_str() {
            "twitter" => Some(SocialPlatform::Twitter),
            "instagram" => Some(SocialPlatform::Instagram),
            "tiktok" => Some(SocialPlatform::TikTok),
            _ => None,
        }
    }
}

/// Detect the source type of a URL. Never fails: malformed input is
/// reported as `Unsupported`.
pub fn detect_video_source(url: &str) -> VideoSourceInfo {
    let info = VideoSourceInfo::from_kind(&classify(url));
    if !info.is_supported() {
        log::debug!("Unsupported source: {}", url);
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_detection() {
        let info = detect_video_source("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(info.source_type, VideoSourceType::YouTube);
        assert_eq!(info.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert!(info.requires_web_view);
        assert!(!info.requires_age_verification);
    }

    #[test]
    fn test_youtube_host_without_video_id() {
        let info = detect_video_source("https://www.youtube.com/playlist?list=PL123");
        assert_eq!(info.source_type, VideoSourceType::YouTube);
        assert_eq!(info.video_id, None);
        assert!(info.is_supported());
    }

    #[test]
    fn test_stream_types() {
        let hls = detect_video_source("https://cdn.test/live/master.m3u8?token=1");
        assert_eq!(hls.source_type, VideoSourceType::Stream);
        assert_eq!(hls.stream_type, Some(StreamType::Hls));

        let dash = detect_video_source("https://cdn.test/manifest.mpd");
        assert_eq!(dash.stream_type, Some(StreamType::Dash));
        assert!(!dash.requires_web_view);
    }

    #[test]
    fn test_audio_before_video_extensions() {
        assert_eq!(
            detect_video_source("https://cdn.test/podcast.mp3").source_type,
            VideoSourceType::Mp3
        );
        assert_eq!(
            detect_video_source("https://cdn.test/movie.mp4").source_type,
            VideoSourceType::Direct
        );
    }

    #[test]
    fn test_adult_requires_age_verification() {
        let info = detect_video_source("https://www.pornhub.com/view_video.php?viewkey=abc");
        assert_eq!(info.source_type, VideoSourceType::Adult);
        assert_eq!(info.platform, "Pornhub");
        assert!(info.requires_age_verification);
    }

    #[test]
    fn test_social_requires_web_view() {
        let info = detect_video_source("https://www.tiktok.com/@user/video/7234567890123456789");
        assert_eq!(info.source_type, VideoSourceType::Social);
        assert!(info.requires_web_view);
        assert_eq!(info.social_platform(), Some(SocialPlatform::TikTok));
        assert_eq!(info.video_id.as_deref(), Some("7234567890123456789"));
    }

    #[test]
    fn test_unsupported_is_total() {
        for url in ["", "   ", "::not a url::", "https://example.com/index.html", "rtmp://live.test/app/stream"] {
            let info = detect_video_source(url);
            assert_eq!(info.source_type, VideoSourceType::Unsupported, "url {url:?}");
            assert_eq!(info, detect_video_source(url));
        }
        assert_eq!(detect_video_source("https://example.com/x").platform, "example.com");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(detect_video_source("https://cdn.test/a.m3u8")).unwrap();
        assert_eq!(json["type"], "stream");
        assert_eq!(json["streamType"], "hls");
        assert_eq!(json["requiresWebView"], false);
    }
}
