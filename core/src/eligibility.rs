//! Membership tiers and the playback eligibility gate.

use serde::{Deserialize, Serialize};

use crate::detect::{VideoSourceInfo, VideoSourceType, detect_video_source};

/// Membership tier enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl MembershipTier {
    /// Parse from string (case-insensitive). Unknown tiers are treated as free.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "premium" => MembershipTier::Premium,
            "pro" => MembershipTier::Pro,
            _ => MembershipTier::Free,
        }
    }

    pub fn supports_adult_content(&self) -> bool {
        matches!(self, MembershipTier::Premium | MembershipTier::Pro)
    }

    /// Videos per day handed to the quota service; `None` means unlimited
    pub fn daily_video_quota(&self) -> Option<u32> {
        match self {
            MembershipTier::Free => Some(10),
            MembershipTier::Premium => Some(100),
            MembershipTier::Pro => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Free => "free",
            MembershipTier::Premium => "premium",
            MembershipTier::Pro => "pro",
        }
    }
}

impl std::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current user's membership
pub trait MembershipProvider: Send + Sync {
    fn tier(&self) -> MembershipTier;

    fn supports_adult_content(&self) -> bool {
        self.tier().supports_adult_content()
    }
}

impl MembershipProvider for MembershipTier {
    fn tier(&self) -> MembershipTier {
        *self
    }
}

/// Outcome of the eligibility gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEligibility {
    pub can_play: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PlaybackEligibility {
    pub fn allowed() -> Self {
        Self {
            can_play: true,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            can_play: false,
            reason: Some(reason.into()),
        }
    }
}

/// Decide whether `url` may be played at the given membership. Pure: no
/// I/O and no quota is consumed.
pub fn can_play_video(url: &str, membership: &dyn MembershipProvider) -> PlaybackEligibility {
    check_eligibility(&detect_video_source(url), membership)
}

/// Same as [`can_play_video`] for an already classified source
pub fn check_eligibility(info: &VideoSourceInfo, membership: &dyn MembershipProvider) -> PlaybackEligibility {
    match info.source_type {
        VideoSourceType::Unsupported => {
            PlaybackEligibility::denied(format!("Unsupported platform: {}", info.platform))
        }
        VideoSourceType::Adult if !membership.supports_adult_content() => {
            PlaybackEligibility::denied("Adult content requires premium membership")
        }
        _ => PlaybackEligibility::allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADULT_URL: &str = "https://www.xhamster.com/videos/some-title-123";

    #[test]
    fn test_adult_requires_premium() {
        let free = can_play_video(ADULT_URL, &MembershipTier::Free);
        assert!(!free.can_play);
        assert!(free.reason.unwrap().contains("requires premium membership"));

        assert!(can_play_video(ADULT_URL, &MembershipTier::Premium).can_play);
        assert!(can_play_video(ADULT_URL, &MembershipTier::Pro).can_play);
    }

    #[test]
    fn test_unsupported_names_platform() {
        let result = can_play_video("https://example.org/watch/1", &MembershipTier::Pro);
        assert!(!result.can_play);
        assert_eq!(result.reason.as_deref(), Some("Unsupported platform: example.org"));
    }

    #[test]
    fn test_supported_content_plays_on_free() {
        for url in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://cdn.test/movie.mp4",
            "https://cdn.test/live.m3u8",
            "https://twitter.com/user/status/1",
        ] {
            assert_eq!(can_play_video(url, &MembershipTier::Free), PlaybackEligibility::allowed());
        }
    }

    #[test]
    fn test_gate_is_idempotent() {
        let first = can_play_video(ADULT_URL, &MembershipTier::Free);
        let second = can_play_video(ADULT_URL, &MembershipTier::Free);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_provider() {
        struct Comped;
        impl MembershipProvider for Comped {
            fn tier(&self) -> MembershipTier {
                MembershipTier::Free
            }
            fn supports_adult_content(&self) -> bool {
                true
            }
        }
        assert!(can_play_video(ADULT_URL, &Comped).can_play);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(MembershipTier::parse("PREMIUM"), MembershipTier::Premium);
        assert_eq!(MembershipTier::parse("pro"), MembershipTier::Pro);
        assert_eq!(MembershipTier::parse("gold"), MembershipTier::Free);
        assert_eq!(MembershipTier::Pro.daily_video_quota(), None);
    }
}
