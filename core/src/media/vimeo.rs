use async_trait::async_trait;
use log::info;
use serde::Deserialize;

use super::{MediaResolver, ParsedVideoSource, SourceType, VideoMetadata};
use crate::classify::vimeo_video_id;
use crate::error::{ResolveError, ResolveResult};

const DEFAULT_OEMBED_ENDPOINT: &str = "https://vimeo.com/api/oembed.json";

#[derive(Debug, Deserialize)]
struct VimeoOEmbed {
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    thumbnail_url: Option<String>,
    author_name: Option<String>,
    upload_date: Option<String>,
}

/// Resolver for vimeo.com and player.vimeo.com links
pub struct VimeoResolver {
    client: reqwest::Client,
    oembed_endpoint: String,
}

impl Default for VimeoResolver {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl VimeoResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
        }
    }

    pub fn with_oembed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oembed_endpoint = endpoint.into();
        self
    }

    pub fn extract_video_id(&self, url: &str) -> ResolveResult<String> {
        vimeo_video_id(url).ok_or_else(|| ResolveError::InvalidUrl {
            platform: "Vimeo",
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl MediaResolver for VimeoResolver {
    fn name(&self) -> &'static str {
        "vimeo"
    }

    fn can_resolve(&self, url: &str) -> bool {
        vimeo_video_id(url).is_some()
    }

    async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
        let id = self.extract_video_id(url)?;
        Ok(
            ParsedVideoSource::new(&format!("https://player.vimeo.com/video/{id}"), SourceType::Stream)?
                .with_format("vimeo"),
        )
    }

    async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        let id = self.extract_video_id(url)?;
        let canonical = format!("https://vimeo.com/{id}");

        info!("Fetching Vimeo metadata for {}", id);
        let response: VimeoOEmbed = self
            .client
            .get(&self.oembed_endpoint)
            .query(&[("url", canonical.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if response.title.is_none() && response.author_name.is_none() && response.thumbnail_url.is_none() {
            return Err(ResolveError::Metadata(format!("empty oEmbed response for video {id}")));
        }

        Ok(VideoMetadata {
            title: response.title,
            description: response.description.filter(|d| !d.is_empty()),
            duration: response.duration,
            thumbnail: response.thumbnail_url,
            author: response.author_name,
            publish_date: response.upload_date,
        })
    }
}
