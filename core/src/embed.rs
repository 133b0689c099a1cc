//! Social media embedding: per-platform strategy lists and the fallback
//! chain that walks them.

mod chain;
mod strategies;

use std::collections::HashMap;

use crate::classify::{SocialPlatform, social_platform, social_video_id};

pub use chain::{
    ChainFailure, ChainPolicy, ChainState, ChainStep, EmbedAttempt, EmbedFailure, EmbedFallbackChain,
    EmbedLoader, EmbedOutcome, EmbedTask, FailureOutcome, ManualRetryError,
};
pub use strategies::strategies_for;

/// Builds an embed URL from the original URL and the extracted post ID.
/// Returns `None` when the strategy cannot be used for this URL.
pub type EmbedUrlBuilder = fn(url: &str, video_id: Option<&str>) -> Option<String>;

/// One way of embedding a social post
#[derive(Debug, Clone, Copy)]
pub struct EmbedStrategy {
    pub name: &'static str,
    /// Lower runs first
    pub priority: u8,
    pub get_embed_url: EmbedUrlBuilder,
    pub headers: &'static [(&'static str, &'static str)],
    pub user_agent: Option<&'static str>,
}

impl EmbedStrategy {
    pub fn embed_url(&self, url: &str, video_id: Option<&str>) -> Option<String> {
        (self.get_embed_url)(url, video_id)
    }

    pub fn header_map(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// Embed configuration for one resolution request
#[derive(Debug, Clone)]
pub struct SocialMediaConfig {
    pub platform: SocialPlatform,
    pub url: String,
    pub video_id: Option<String>,
    pub embed_strategies: &'static [EmbedStrategy],
}

/// Embed configuration for a Twitter, Instagram or TikTok URL
pub fn get_social_media_config(url: &str) -> Option<SocialMediaConfig> {
    let url = url.trim();
    let platform = social_platform(url)?;
    Some(SocialMediaConfig {
        platform,
        url: url.to_string(),
        video_id: social_video_id(platform, url),
        embed_strategies: strategies_for(platform),
    })
}
