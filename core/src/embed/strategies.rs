//! Per-platform embed strategy tables.

use once_cell::sync::Lazy;

use super::EmbedStrategy;
use crate::classify::{SocialPlatform, instagram_post_kind};

const MOBILE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

const DESKTOP_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

fn encode(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

fn sorted(mut strategies: Vec<EmbedStrategy>) -> Vec<EmbedStrategy> {
    strategies.sort_by_key(|s| s.priority);
    strategies
}

static TWITTER: Lazy<Vec<EmbedStrategy>> = Lazy::new(|| {
    sorted(vec![
        EmbedStrategy {
            name: "twitter-publish",
            priority: 1,
            get_embed_url: |_, id| {
                id.map(|id| format!("https://platform.twitter.com/embed/Tweet.html?id={id}&theme=dark"))
            },
            headers: &[],
            user_agent: None,
        },
        EmbedStrategy {
            name: "twitframe",
            priority: 2,
            get_embed_url: |url, _| Some(format!("https://twitframe.com/show?url={}", encode(url))),
            headers: &[],
            user_agent: None,
        },
        EmbedStrategy {
            name: "fxtwitter",
            priority: 3,
            get_embed_url: |_, id| id.map(|id| format!("https://fxtwitter.com/i/status/{id}")),
            headers: &[],
            user_agent: Some(MOBILE_SAFARI),
        },
        EmbedStrategy {
            name: "direct",
            priority: 4,
            get_embed_url: |url, _| Some(url.to_string()),
            headers: &[("Referer", "https://twitter.com/")],
            user_agent: Some(MOBILE_SAFARI),
        },
    ])
});

static INSTAGRAM: Lazy<Vec<EmbedStrategy>> = Lazy::new(|| {
    sorted(vec![
        EmbedStrategy {
            name: "instagram-embed",
            priority: 1,
            get_embed_url: |url, id| {
                let kind = instagram_post_kind(url)?;
                id.map(|id| format!("https://www.instagram.com/{kind}/{id}/embed/"))
            },
            headers: &[],
            user_agent: None,
        },
        EmbedStrategy {
            name: "instagram-captioned",
            priority: 2,
            get_embed_url: |url, id| {
                let kind = instagram_post_kind(url)?;
                id.map(|id| format!("https://www.instagram.com/{kind}/{id}/embed/captioned/"))
            },
            headers: &[],
            user_agent: Some(DESKTOP_CHROME),
        },
        EmbedStrategy {
            name: "direct",
            priority: 3,
            get_embed_url: |url, _| Some(url.to_string()),
            headers: &[("Referer", "https://www.instagram.com/")],
            user_agent: Some(MOBILE_SAFARI),
        },
    ])
});

static TIKTOK: Lazy<Vec<EmbedStrategy>> = Lazy::new(|| {
    sorted(vec![
        EmbedStrategy {
            name: "tiktok-embed-v2",
            priority: 1,
            get_embed_url: |_, id| id.map(|id| format!("https://www.tiktok.com/embed/v2/{id}")),
            headers: &[],
            user_agent: None,
        },
        EmbedStrategy {
            name: "tiktok-player",
            priority: 2,
            get_embed_url: |_, id| id.map(|id| format!("https://www.tiktok.com/player/v1/{id}?autoplay=1")),
            headers: &[],
            user_agent: None,
        },
        EmbedStrategy {
            name: "tiktok-embed",
            priority: 3,
            get_embed_url: |_, id| id.map(|id| format!("https://www.tiktok.com/embed/{id}")),
            headers: &[],
            user_agent: Some(DESKTOP_CHROME),
        },
        EmbedStrategy {
            name: "direct",
            priority: 4,
            get_embed_url: |url, _| Some(url.to_string()),
            headers: &[("Referer", "https://www.tiktok.com/")],
            user_agent: Some(MOBILE_SAFARI),
        },
    ])
});

/// Static strategy list for a platform, ordered by priority
pub fn strategies_for(platform: SocialPlatform) -> &'static [EmbedStrategy] {
    match platform {
        SocialPlatform::Twitter => &TWITTER,
        SocialPlatform::Instagram => &INSTAGRAM,
        SocialPlatform::TikTok => &TIKTOK,
    }
}
