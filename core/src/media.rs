mod adult;
mod direct;
mod vimeo;
mod youtube;

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ResolveError, ResolveResult};

pub use adult::AdultPlatformResolver;
pub use direct::{DirectVideoResolver, parse_hls_master};
pub use vimeo::VimeoResolver;
pub use youtube::YouTubeResolver;

/// How a resolved source is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Direct,
    Stream,
    Hls,
    Dash,
    Rtmp,
}

/// Pixel dimensions of a stream variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// One rendition advertised by an adaptive stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub quality: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// Output of a resolver. `url` is always an absolute URI and `variants`,
/// when present, is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedVideoSource {
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<StreamVariant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
}

impl ParsedVideoSource {
    /// Validate `url` and build a source with no optional fields set
    pub fn new(url: &str, source_type: SourceType) -> ResolveResult<Self> {
        let parsed = url::Url::parse(url).map_err(|source| ResolveError::Malformed {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            url: parsed.to_string(),
            source_type,
            format: None,
            variants: None,
            headers: None,
            requires_auth: None,
        })
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Attach variants, keeping the field unset for an empty list
    pub fn with_variants(mut self, variants: Vec<StreamVariant>) -> Self {
        self.variants = (!variants.is_empty()).then_some(variants);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = Some(requires_auth);
        self
    }
}

/// Optional enrichment, fetched independently of resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
}

/// Common for all source resolvers
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Short platform name used in logs and errors
    fn name(&self) -> &'static str;

    /// Cheap pattern test, never performs I/O
    fn can_resolve(&self, url: &str) -> bool;

    /// Normalize the URL into a playable source. Must succeed for any
    /// well-formed URL that `can_resolve` accepted.
    async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource>;

    /// Look up title, author and friends. Resolvers without a metadata
    /// source return empty metadata.
    async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        let _ = url;
        Ok(VideoMetadata::default())
    }
}

/// Ordered resolver registry
pub struct SourceParserService {
    resolvers: Vec<Box<dyn MediaResolver>>,
}

impl Default for SourceParserService {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SourceParserService {
    /// Register the standard resolvers. Platform-specific resolvers come
    /// before the generic ones so a YouTube link is never treated as a
    /// plain file.
    pub fn new(config: &EngineConfig) -> Self {
        let client = config.http_client();
        Self::with_resolvers(vec![
            Box::new(YouTubeResolver::new(client.clone())),
            Box::new(VimeoResolver::new(client.clone())),
            Box::new(DirectVideoResolver::new(client, config.probe_hls_variants)),
            Box::new(AdultPlatformResolver),
        ])
    }

    /// Use a custom resolver set, checked in the given order
    pub fn with_resolvers(resolvers: Vec<Box<dyn MediaResolver>>) -> Self {
        Self { resolvers }
    }

    /// First resolver whose `can_resolve` accepts the URL
    pub fn find_resolver(&self, url: &str) -> Option<&dyn MediaResolver> {
        let found = self
            .resolvers
            .iter()
            .find(|r| r.can_resolve(url))
            .map(|r| r.as_ref());

        match found {
            Some(resolver) => debug!("{} resolver claims {}", resolver.name(), url),
            None => debug!("No resolver claims {}", url),
        }
        found
    }

    pub fn can_parse(&self, url: &str) -> bool {
        self.find_resolver(url).is_some()
    }

    pub fn get_platform(&self, url: &str) -> Option<&'static str> {
        self.find_resolver(url).map(|r| r.name())
    }

    /// Resolve through the first matching resolver. Resolver errors are
    /// returned to the caller unchanged.
    pub async fn parse(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
        let resolver = self
            .find_resolver(url)
            .ok_or_else(|| ResolveError::NoResolver(url.to_string()))?;

        resolver.resolve(url).await.inspect_err(|e| {
            if matches!(e, ResolveError::InvalidUrl { .. }) {
                warn!(
                    "{} resolver accepted {} but could not resolve it: {}",
                    resolver.name(),
                    url,
                    e
                );
            }
        })
    }

    pub async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        let resolver = self
            .find_resolver(url)
            .ok_or_else(|| ResolveError::NoResolver(url.to_string()))?;
        resolver.fetch_metadata(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_wins_over_direct() {
        let service = SourceParserService::default();
        // Also passes the direct resolver's extension test
        let url = "https://youtu.be/dQw4w9WgXcQ.mp4";
        assert!(DirectVideoResolver::default().can_resolve(url));
        assert_eq!(service.get_platform(url), Some("youtube"));
        assert_eq!(service.get_platform("https://cdn.test/clip.mp4"), Some("direct"));
    }

    #[test]
    fn test_registration_order() {
        let service = SourceParserService::default();
        let names: Vec<_> = service.resolvers.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["youtube", "vimeo", "direct", "adult"]);
    }

    #[test]
    fn test_unknown_url_has_no_resolver() {
        let service = SourceParserService::default();
        assert!(service.find_resolver("https://example.com/about").is_none());
        assert!(!service.can_parse("not a url"));
    }

    #[tokio::test]
    async fn test_parse_without_resolver_errors() {
        let service = SourceParserService::default();
        let err = service.parse("https://example.com/about").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoResolver(_)));
    }

    #[tokio::test]
    async fn test_parse_propagates_resolver_errors() {
        struct Broken;

        #[async_trait]
        impl MediaResolver for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn can_resolve(&self, _url: &str) -> bool {
                true
            }
            async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
                Err(ResolveError::InvalidUrl {
                    platform: "broken",
                    url: url.to_string(),
                })
            }
        }

        let service = SourceParserService::with_resolvers(vec![Box::new(Broken)]);
        let err = service.parse("https://anything.test").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { platform: "broken", .. }));
        assert_eq!(
            service.fetch_metadata("https://anything.test").await.unwrap(),
            VideoMetadata::default()
        );
    }

    #[test]
    fn test_empty_variants_are_dropped() {
        let source = ParsedVideoSource::new("https://cdn.test/a.m3u8", SourceType::Hls)
            .unwrap()
            .with_variants(Vec::new());
        assert!(source.variants.is_none());
    }

    #[test]
    fn test_relative_url_is_rejected() {
        let err = ParsedVideoSource::new("/relative/clip.mp4", SourceType::Direct).unwrap_err();
        assert!(matches!(err, ResolveError::Malformed { .. }));
    }
}
