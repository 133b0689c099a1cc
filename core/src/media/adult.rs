use async_trait::async_trait;

use super::{MediaResolver, ParsedVideoSource, SourceType, VideoMetadata};
use crate::classify::adult_platform;
use crate::error::ResolveResult;

/// Resolver for the adult platform allowlist.
///
/// Always reports `requires_auth: false`. Whether the viewer may watch is
/// decided by [`crate::eligibility::can_play_video`], not here.
pub struct AdultPlatformResolver;

impl AdultPlatformResolver {
    /// Display name derived from the matching domain, e.g. `Xvideos`
    pub fn detect_platform(&self, url: &str) -> Option<String> {
        adult_platform(url)
    }
}

#[async_trait]
impl MediaResolver for AdultPlatformResolver {
    fn name(&self) -> &'static str {
        "adult"
    }

    fn can_resolve(&self, url: &str) -> bool {
        adult_platform(url).is_some()
    }

    async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
        let source = ParsedVideoSource::new(url.trim(), SourceType::Stream)?.with_requires_auth(false);
        Ok(match self.detect_platform(url) {
            Some(platform) => source.with_format(platform.to_lowercase()),
            None => source,
        })
    }

    async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        Ok(VideoMetadata {
            author: self.detect_platform(url),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_without_auth() {
        let resolver = AdultPlatformResolver;
        let url = "https://www.xvideos.com/video123/title";
        assert!(resolver.can_resolve(url));
        assert_eq!(resolver.detect_platform(url).as_deref(), Some("Xvideos"));

        let source = resolver.resolve(url).await.unwrap();
        assert_eq!(source.source_type, SourceType::Stream);
        assert_eq!(source.requires_auth, Some(false));
    }

    #[test]
    fn test_ignores_other_domains() {
        assert!(!AdultPlatformResolver.can_resolve("https://vimeo.com/1234"));
    }
}
