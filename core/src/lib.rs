pub mod classify;
pub mod config;
pub mod control;
pub mod detect;
pub mod diagnostics;
pub mod eligibility;
pub mod embed;
pub mod error;
pub mod events;
pub mod media;
pub mod select;
pub mod settings;
pub mod voice;

// Re-exports
pub use classify::{SourceKind, classify};
pub use config::EngineConfig;
pub use control::{ActivePlayer, ControlPayload, PlayerControl};
pub use detect::{VideoSourceInfo, VideoSourceType, detect_video_source};
pub use diagnostics::{PlayerDiagnostics, PlayerError};
pub use eligibility::{MembershipProvider, MembershipTier, PlaybackEligibility, can_play_video};
pub use embed::{EmbedFallbackChain, SocialMediaConfig, get_social_media_config};
pub use error::{ControlError, ResolveError, SettingsError};
pub use events::{Event, EventBus};
pub use media::{MediaResolver, ParsedVideoSource, SourceParserService, VideoMetadata};
pub use select::{Platform, PlayerRoute, PlayerSelector, select_player};
pub use settings::{JsonSettingsStore, SettingsStore, VoiceSettings};
pub use voice::{ParsedVoiceCommand, VoiceCommandProcessor, parse_voice_command};

/// Everything needed to route one URL
#[derive(Debug, Clone)]
pub struct PlaybackDecision {
    pub source: VideoSourceInfo,
    pub eligibility: PlaybackEligibility,
    pub route: PlayerRoute,
}

/// Classify a URL, gate it on membership and pick a player in one call
pub fn plan_playback(
    url: &str,
    membership: &dyn MembershipProvider,
    platform: Platform,
    age_verified: bool,
) -> PlaybackDecision {
    let source = detect_video_source(url);
    let eligibility = eligibility::check_eligibility(&source, membership);
    let route = select_player(url, &source, &eligibility, platform, age_verified);
    PlaybackDecision {
        source,
        eligibility,
        route,
    }
}
