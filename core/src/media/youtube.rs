use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use super::{MediaResolver, ParsedVideoSource, SourceType, VideoMetadata};
use crate::classify::youtube_video_id;
use crate::error::{ResolveError, ResolveResult};

const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Response from YouTube's oEmbed endpoint
#[derive(Debug, Deserialize)]
struct YouTubeOEmbed {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Resolver for youtube.com / youtu.be links
pub struct YouTubeResolver {
    client: reqwest::Client,
    oembed_endpoint: String,
}

impl Default for YouTubeResolver {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl YouTubeResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
        }
    }

    /// Point metadata lookups at a different oEmbed endpoint
    pub fn with_oembed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oembed_endpoint = endpoint.into();
        self
    }

    /// Extract the 11-character video ID
    pub fn extract_video_id(&self, url: &str) -> ResolveResult<String> {
        extract_youtube_id(url).ok_or_else(|| ResolveError::InvalidUrl {
            platform: "YouTube",
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl MediaResolver for YouTubeResolver {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn can_resolve(&self, url: &str) -> bool {
        is_youtube_url(url)
    }

    async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
        let id = self.extract_video_id(url)?;
        debug!("Resolved YouTube video ID {} from {}", id, url);

        Ok(
            ParsedVideoSource::new(&format!("https://www.youtube.com/watch?v={id}"), SourceType::Stream)?
                .with_format("youtube"),
        )
    }

    async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        let id = self.extract_video_id(url)?;
        let watch_url = format!("https://www.youtube.com/watch?v={id}");

        info!("Fetching YouTube metadata for {}", id);
        let response: YouTubeOEmbed = self
            .client
            .get(&self.oembed_endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if response.title.is_none() && response.author_name.is_none() {
            return Err(ResolveError::Metadata(format!("oEmbed response for {id} has no title or author")));
        }

        Ok(VideoMetadata {
            title: response.title,
            author: response.author_name,
            thumbnail: response
                .thumbnail_url
                .or_else(|| Some(format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))),
            ..Default::default()
        })
    }
}

/// Helper function to extract YouTube video ID from URL
pub fn extract_youtube_id(url: &str) -> Option<String> {
    youtube_video_id(url)
}

/// Check if a URL is a valid YouTube URL
pub fn is_youtube_url(url: &str) -> bool {
    youtube_video_id(url).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_resolve_normalizes_to_watch_url() {
        let resolver = YouTubeResolver::default();
        for url in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ] {
            assert!(resolver.can_resolve(url));
            let source = resolver.resolve(url).await.unwrap();
            assert_eq!(source.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
            assert_eq!(source.source_type, SourceType::Stream);
            assert_eq!(source.format.as_deref(), Some("youtube"));
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_unclaimed_url() {
        let resolver = YouTubeResolver::default();
        assert!(!resolver.can_resolve("https://www.youtube.com/feed/trending"));
        let err = resolver
            .resolve("https://www.youtube.com/feed/trending")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid YouTube URL: https://www.youtube.com/feed/trending");
    }

    #[tokio::test]
    async fn test_fetch_metadata_from_oembed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Never Gonna Give You Up",
                "author_name": "Rick Astley",
                "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
            })))
            .mount(&server)
            .await;

        let resolver = YouTubeResolver::default()
            .with_oembed_endpoint(format!("{}/oembed", server.uri()));
        let meta = resolver
            .fetch_metadata("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap();

        assert_eq!(meta.title.as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(meta.author.as_deref(), Some("Rick Astley"));
        assert!(meta.duration.is_none());
    }

    #[tokio::test]
    async fn test_fetch_metadata_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = YouTubeResolver::default()
            .with_oembed_endpoint(format!("{}/oembed", server.uri()));
        let err = resolver
            .fetch_metadata("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_metadata_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let resolver = YouTubeResolver::default()
            .with_oembed_endpoint(format!("{}/oembed", server.uri()));
        let err = resolver
            .fetch_metadata("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Metadata(_)));
    }
}
