//! URL classification shared by the resolvers and the source detector.
//!
//! Every pattern table lives here so that `MediaResolver::can_resolve` and
//! `detect_video_source` read the same data. Tables are compiled once and
//! never mutated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Video ID extraction patterns for YouTube, tried in order
static YOUTUBE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[/.])youtube(?:-nocookie)?\.com/watch\?(?:[^#]*?&)?v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"(?i)(?:^|[/.])youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"(?i)(?:^|[/.])youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"(?i)(?:^|[/.])youtube\.com/shorts/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"(?i)(?:^|[/.])youtube\.com/v/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"(?i)(?:^|[/.])youtube\.com/live/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile YouTube pattern"))
    .collect()
});

/// Video ID extraction patterns for Vimeo, tried in order
static VIMEO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[/.])player\.vimeo\.com/video/(\d+)",
        r"(?i)(?:^|[/.])vimeo\.com/channels/[^/?#]+/(\d+)",
        r"(?i)(?:^|[/.])vimeo\.com/groups/[^/?#]+/videos/(\d+)",
        r"(?i)(?:^|[/.])vimeo\.com/(?:video/)?(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile Vimeo pattern"))
    .collect()
});

static TWITTER_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/status(?:es)?/(\d+)").expect("Failed to compile Twitter pattern"));

static INSTAGRAM_POST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(p|reels?|tv)/([A-Za-z0-9_-]+)").expect("Failed to compile Instagram pattern")
});

static TIKTOK_VIDEO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:video|v)/(\d+)").expect("Failed to compile TikTok pattern"));

/// Container extensions handled by the direct video resolver
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "ogg", "ogv", "mkv", "avi", "mov", "flv", "wmv", "3gp", "ts", "m4v",
];

/// Audio-only extensions, played through the audio path
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "flac", "opus", "oga"];

/// Adult platform allowlist, matched by substring
pub const ADULT_DOMAINS: &[&str] = &[
    "pornhub.com",
    "xvideos.com",
    "xnxx.com",
    "redtube.com",
    "youporn.com",
    "xhamster.com",
    "spankbang.com",
    "tube8.com",
    "beeg.com",
    "eporner.com",
    "tnaflix.com",
    "motherless.com",
];

const YOUTUBE_DOMAINS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

const VIMEO_DOMAINS: &[&str] = &["vimeo.com"];

const SOCIAL_DOMAINS: &[(&str, SocialPlatform)] = &[
    ("twitter.com", SocialPlatform::Twitter),
    ("x.com", SocialPlatform::Twitter),
    ("instagram.com", SocialPlatform::Instagram),
    ("tiktok.com", SocialPlatform::TikTok),
];

/// Streaming protocols recognised from the URL alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    Hls,
    Dash,
    Rtmp,
}

/// Social networks that can only be played through an embed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Instagram,
    TikTok,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::TikTok => "tiktok",
        }
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single classification of a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// `video_id` is `None` for channel, playlist and other non-video pages
    YouTube { video_id: Option<String> },
    Vimeo { video_id: Option<String> },
    Stream { protocol: StreamProtocol },
    Audio { extension: &'static str },
    VideoFile { extension: &'static str },
    Adult { platform: String },
    Social { platform: SocialPlatform, video_id: Option<String> },
    Unsupported { host: Option<String> },
}

/// Classify a URL. Total and deterministic: every input maps to exactly one
/// kind, with `Unsupported` as the catch-all.
///
/// Precedence: YouTube host, Vimeo host, HLS/DASH manifest, audio
/// extension, video extension, adult allowlist, social network, unsupported.
/// RTMP is left to the direct resolver and classifies as unsupported here.
pub fn classify(url: &str) -> SourceKind {
    let url = url.trim();

    if host_matches(url, YOUTUBE_DOMAINS) {
        return SourceKind::YouTube {
            video_id: youtube_video_id(url),
        };
    }
    if host_matches(url, VIMEO_DOMAINS) {
        return SourceKind::Vimeo {
            video_id: vimeo_video_id(url),
        };
    }
    if let Some(protocol) = stream_protocol(url).filter(|p| *p != StreamProtocol::Rtmp) {
        return SourceKind::Stream { protocol };
    }
    if let Some(extension) = matching_extension(url, AUDIO_EXTENSIONS) {
        return SourceKind::Audio { extension };
    }
    if let Some(extension) = matching_extension(url, VIDEO_EXTENSIONS) {
        return SourceKind::VideoFile { extension };
    }
    if let Some(platform) = adult_platform(url) {
        return SourceKind::Adult { platform };
    }
    if let Some(platform) = social_platform(url) {
        return SourceKind::Social {
            platform,
            video_id: social_video_id(platform, url),
        };
    }

    SourceKind::Unsupported { host: host_of(url) }
}

/// First YouTube pattern that matches wins
pub fn youtube_video_id(url: &str) -> Option<String> {
    first_capture(&YOUTUBE_PATTERNS, url)
}

/// First Vimeo pattern that matches wins
pub fn vimeo_video_id(url: &str) -> Option<String> {
    first_capture(&VIMEO_PATTERNS, url)
}

fn first_capture(patterns: &[Regex], url: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Detect HLS, DASH or RTMP from the URL shape
pub fn stream_protocol(url: &str) -> Option<StreamProtocol> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("rtmp://") || lower.starts_with("rtmps://") {
        return Some(StreamProtocol::Rtmp);
    }

    let path = strip_query(&lower);
    if path.ends_with(".m3u8") {
        Some(StreamProtocol::Hls)
    } else if path.ends_with(".mpd") {
        Some(StreamProtocol::Dash)
    } else {
        None
    }
}

/// Case-insensitive suffix match on the path, ignoring query and fragment
pub fn matching_extension(url: &str, extensions: &[&'static str]) -> Option<&'static str> {
    let lower = url.trim().to_ascii_lowercase();
    let path = strip_query(&lower);
    extensions.iter().copied().find(|ext| {
        path.len() > ext.len() + 1
            && path.ends_with(ext)
            && path.as_bytes()[path.len() - ext.len() - 1] == b'.'
    })
}

/// Display name of the adult platform hosting the URL, if any
pub fn adult_platform(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    ADULT_DOMAINS
        .iter()
        .find(|domain| lower.contains(*domain))
        .map(|domain| platform_display_name(domain))
}

/// Title-case a domain without its `.com` suffix: `pornhub.com` -> `Pornhub`
pub fn platform_display_name(domain: &str) -> String {
    let base = domain.strip_suffix(".com").unwrap_or(domain);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Social network hosting the URL, matched on the host name
pub fn social_platform(url: &str) -> Option<SocialPlatform> {
    let host = host_of(url)?;
    SOCIAL_DOMAINS
        .iter()
        .find(|(domain, _)| is_domain_or_subdomain(&host, domain))
        .map(|(_, platform)| *platform)
}

fn host_matches(url: &str, domains: &[&str]) -> bool {
    host_of(url).is_some_and(|host| domains.iter().any(|domain| is_domain_or_subdomain(&host, domain)))
}

fn is_domain_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

/// Post or video identifier used to build embed URLs
pub fn social_video_id(platform: SocialPlatform, url: &str) -> Option<String> {
    match platform {
        SocialPlatform::Twitter => TWITTER_STATUS
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        SocialPlatform::Instagram => INSTAGRAM_POST
            .captures(url)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string()),
        SocialPlatform::TikTok => TIKTOK_VIDEO
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    }
}

/// Instagram path segment (`p`, `reel`, `tv`) for embed URL construction
pub fn instagram_post_kind(url: &str) -> Option<String> {
    INSTAGRAM_POST
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('s').to_string())
}

/// Lowercased host name. Scheme-less input such as `vimeo.com/123` is
/// retried with an `https://` prefix.
pub fn host_of(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let parsed = url::Url::parse(url)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| url::Url::parse(&format!("https://{url}")).ok());

    parsed
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .filter(|h| !h.is_empty())
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_variants_share_id() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=10",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
        ];
        for url in urls {
            assert_eq!(
                youtube_video_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "failed for {url}"
            );
        }
    }

    #[test]
    fn test_youtube_rejects_wrong_length_id() {
        assert_eq!(youtube_video_id("https://youtu.be/short"), None);
        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQx"), None);
    }

    #[test]
    fn test_vimeo_ids() {
        assert_eq!(vimeo_video_id("https://vimeo.com/76979871").as_deref(), Some("76979871"));
        assert_eq!(
            vimeo_video_id("https://player.vimeo.com/video/76979871?h=abc").as_deref(),
            Some("76979871")
        );
        assert_eq!(
            vimeo_video_id("https://vimeo.com/channels/staffpicks/76979871").as_deref(),
            Some("76979871")
        );
        assert_eq!(vimeo_video_id("https://vimeo.com/about"), None);
    }

    #[test]
    fn test_extension_match_tolerates_query_only() {
        assert_eq!(
            matching_extension("https://x.com/v.mp4?token=abc", VIDEO_EXTENSIONS),
            Some("mp4")
        );
        assert_eq!(matching_extension("https://x.com/v.mp4extra", VIDEO_EXTENSIONS), None);
        assert_eq!(matching_extension("https://x.com/V.MOV", VIDEO_EXTENSIONS), Some("mov"));
        assert_eq!(matching_extension("https://x.com/clip.ts#t=3", VIDEO_EXTENSIONS), Some("ts"));
        assert_eq!(matching_extension("https://x.com/mp4", VIDEO_EXTENSIONS), None);
    }

    #[test]
    fn test_stream_protocols() {
        assert_eq!(stream_protocol("https://cdn.test/live/index.m3u8?s=1"), Some(StreamProtocol::Hls));
        assert_eq!(stream_protocol("https://cdn.test/manifest.MPD"), Some(StreamProtocol::Dash));
        assert_eq!(stream_protocol("rtmp://live.test/app/key"), Some(StreamProtocol::Rtmp));
        assert_eq!(stream_protocol("https://cdn.test/video.mp4"), None);
    }

    #[test]
    fn test_youtube_and_vimeo_pages_without_video_id() {
        for url in ["https://www.youtube.com/playlist?list=PL123", "https://www.youtube.com/@channel"] {
            assert_eq!(classify(url), SourceKind::YouTube { video_id: None }, "failed for {url}");
        }
        assert_eq!(
            classify("https://vimeo.com/channels/staffpicks"),
            SourceKind::Vimeo { video_id: None }
        );
        assert_eq!(
            classify("https://m.youtube.com/watch?v=dQw4w9WgXcQ"),
            SourceKind::YouTube {
                video_id: Some("dQw4w9WgXcQ".to_string())
            }
        );
        // Lookalike hosts are not YouTube
        assert!(matches!(classify("https://notyoutube.com/watch"), SourceKind::Unsupported { .. }));
    }

    #[test]
    fn test_rtmp_is_not_a_detected_stream() {
        assert_eq!(
            classify("rtmp://live.test/app/stream"),
            SourceKind::Unsupported {
                host: Some("live.test".to_string())
            }
        );
    }

    #[test]
    fn test_precedence_file_extension_before_social_host() {
        assert_eq!(
            classify("https://x.com/v.mp4?token=abc"),
            SourceKind::VideoFile { extension: "mp4" }
        );
    }

    #[test]
    fn test_adult_before_social() {
        // xnxx.com ends in "x.com" but is not Twitter
        assert_eq!(
            classify("https://www.xnxx.com/video-123/title"),
            SourceKind::Adult { platform: "Xnxx".to_string() }
        );
    }

    #[test]
    fn test_social_classification_with_ids() {
        assert_eq!(
            classify("https://twitter.com/user/status/1234567890"),
            SourceKind::Social {
                platform: SocialPlatform::Twitter,
                video_id: Some("1234567890".to_string())
            }
        );
        assert_eq!(
            classify("https://www.instagram.com/reel/Cabc_123/"),
            SourceKind::Social {
                platform: SocialPlatform::Instagram,
                video_id: Some("Cabc_123".to_string())
            }
        );
        assert_eq!(
            classify("https://vm.tiktok.com/ZMabc/"),
            SourceKind::Social { platform: SocialPlatform::TikTok, video_id: None }
        );
        assert_eq!(instagram_post_kind("https://www.instagram.com/reels/Cabc/").as_deref(), Some("reel"));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        assert_eq!(classify(""), SourceKind::Unsupported { host: None });
        assert_eq!(
            classify("https://example.com/page"),
            SourceKind::Unsupported { host: Some("example.com".to_string()) }
        );
        assert!(matches!(classify("::::"), SourceKind::Unsupported { .. }));
    }

    #[test]
    fn test_classification_is_deterministic() {
        for url in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://cdn.test/a.m3u8",
            "nonsense",
            "https://www.pornhub.com/view_video.php?viewkey=1",
        ] {
            assert_eq!(classify(url), classify(url));
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(platform_display_name("pornhub.com"), "Pornhub");
        assert_eq!(platform_display_name("tube8.com"), "Tube8");
    }
}
