//! Player strategy selection.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::detect::{StreamType, VideoSourceInfo, VideoSourceType, detect_video_source};
use crate::diagnostics::{PlayerDiagnostics, PlayerError};
use crate::eligibility::{MembershipProvider, MembershipTier, PlaybackEligibility, check_eligibility};
use crate::embed::{SocialMediaConfig, get_social_media_config};

pub const DASH_IOS_MESSAGE: &str = "DASH streams are not supported on iOS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    #[default]
    Web,
}

impl Platform {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            "web" => Some(Platform::Web),
            _ => None,
        }
    }
}

/// The one player component chosen for a source
#[derive(Debug, Clone)]
pub enum PlayerRoute {
    /// Not allowed to play; carries the reason shown to the user
    Blocked { reason: String },
    /// Waiting for the user to confirm their age
    AgeGate,
    NativePlayer,
    HlsWebView,
    DashWebView,
    YouTubeWebView { video_id: Option<String> },
    VimeoWebView { video_id: Option<String> },
    /// Adult platform page in a WebView
    EmbedWebView { platform: String },
    /// Social post embed driven by the fallback chain
    SocialWebView(SocialMediaConfig),
    EnhancedMp4,
    Unsupported { reason: String },
}

impl PlayerRoute {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerRoute::Blocked { .. } => "blocked",
            PlayerRoute::AgeGate => "age_gate",
            PlayerRoute::NativePlayer => "native_player",
            PlayerRoute::HlsWebView => "hls_webview",
            PlayerRoute::DashWebView => "dash_webview",
            PlayerRoute::YouTubeWebView { .. } => "youtube_webview",
            PlayerRoute::VimeoWebView { .. } => "vimeo_webview",
            PlayerRoute::EmbedWebView { .. } => "embed_webview",
            PlayerRoute::SocialWebView(_) => "social_webview",
            PlayerRoute::EnhancedMp4 => "enhanced_mp4",
            PlayerRoute::Unsupported { .. } => "unsupported",
        }
    }

    /// Blocked and unsupported routes never lead to playback
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerRoute::Blocked { .. } | PlayerRoute::Unsupported { .. })
    }
}

fn is_native_playable(info: &VideoSourceInfo, platform: Platform) -> bool {
    match info.source_type {
        VideoSourceType::Mp3 => true,
        VideoSourceType::Direct => platform != Platform::Web,
        VideoSourceType::Stream => match info.stream_type {
            Some(StreamType::Hls) => platform != Platform::Web,
            Some(StreamType::Dash) => platform == Platform::Android,
            None => false,
        },
        _ => false,
    }
}

/// Pick the player for a classified source.
///
/// Rules are tried in a fixed priority order and the first that applies
/// decides the route.
pub fn select_player(
    url: &str,
    info: &VideoSourceInfo,
    eligibility: &PlaybackEligibility,
    platform: Platform,
    age_verified: bool,
) -> PlayerRoute {
    let is_dash = info.stream_type == Some(StreamType::Dash);

    if !eligibility.can_play {
        return PlayerRoute::Blocked {
            reason: eligibility
                .reason
                .clone()
                .unwrap_or_else(|| "Playback not allowed".to_string()),
        };
    }
    if info.requires_age_verification && !age_verified {
        return PlayerRoute::AgeGate;
    }
    if is_dash && platform == Platform::Ios {
        return PlayerRoute::Blocked {
            reason: DASH_IOS_MESSAGE.to_string(),
        };
    }
    if is_dash && platform == Platform::Web {
        return PlayerRoute::DashWebView;
    }
    if is_native_playable(info, platform) {
        return PlayerRoute::NativePlayer;
    }
    if info.stream_type == Some(StreamType::Hls) {
        return PlayerRoute::HlsWebView;
    }

    match info.source_type {
        VideoSourceType::YouTube => PlayerRoute::YouTubeWebView {
            video_id: info.video_id.clone(),
        },
        VideoSourceType::Vimeo => PlayerRoute::VimeoWebView {
            video_id: info.video_id.clone(),
        },
        VideoSourceType::Adult => PlayerRoute::EmbedWebView {
            platform: info.platform.clone(),
        },
        VideoSourceType::Social if info.requires_web_view => match get_social_media_config(url) {
            Some(config) => PlayerRoute::SocialWebView(config),
            None => PlayerRoute::Unsupported {
                reason: format!("No embed configuration for {}", info.platform),
            },
        },
        VideoSourceType::Direct => PlayerRoute::EnhancedMp4,
        _ => PlayerRoute::Unsupported {
            reason: format!("Unsupported platform: {}", info.platform),
        },
    }
}

#[derive(Debug, Clone)]
pub enum SelectorState {
    Detecting,
    Routed(PlayerRoute),
}

/// Holds the current route and re-selects only when the URL, membership or
/// age verification changes. Playback errors are recorded, never re-routed.
pub struct PlayerSelector {
    platform: Platform,
    url: Option<String>,
    tier: MembershipTier,
    adult_allowed: bool,
    age_verified: bool,
    info: Option<VideoSourceInfo>,
    state: SelectorState,
    diagnostics: Arc<PlayerDiagnostics>,
    evaluations: usize,
}

impl PlayerSelector {
    pub fn new(platform: Platform, membership: &dyn MembershipProvider, diagnostics: Arc<PlayerDiagnostics>) -> Self {
        Self {
            platform,
            url: None,
            tier: membership.tier(),
            adult_allowed: membership.supports_adult_content(),
            age_verified: false,
            info: None,
            state: SelectorState::Detecting,
            diagnostics,
            evaluations: 0,
        }
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn route(&self) -> Option<&PlayerRoute> {
        match &self.state {
            SelectorState::Routed(route) => Some(route),
            SelectorState::Detecting => None,
        }
    }

    pub fn source_info(&self) -> Option<&VideoSourceInfo> {
        self.info.as_ref()
    }

    /// Number of times a route was computed
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn set_url(&mut self, url: &str) -> &SelectorState {
        if self.url.as_deref() != Some(url) {
            self.url = Some(url.to_string());
            self.info = Some(detect_video_source(url));
            self.reevaluate();
        }
        &self.state
    }

    pub fn set_membership(&mut self, membership: &dyn MembershipProvider) -> &SelectorState {
        let tier = membership.tier();
        let adult_allowed = membership.supports_adult_content();
        if tier != self.tier || adult_allowed != self.adult_allowed {
            debug!("Membership changed to {tier}");
            self.tier = tier;
            self.adult_allowed = adult_allowed;
            self.reevaluate();
        }
        &self.state
    }

    pub fn set_age_verified(&mut self, verified: bool) -> &SelectorState {
        if verified != self.age_verified {
            self.age_verified = verified;
            self.reevaluate();
        }
        &self.state
    }

    /// Record a playback failure from the active player
    pub fn report_playback_error(&self, error: PlayerError) {
        self.diagnostics.log_error(error);
    }

    fn reevaluate(&mut self) {
        let (Some(url), Some(info)) = (&self.url, &self.info) else {
            return;
        };

        let membership = Membership {
            tier: self.tier,
            adult_allowed: self.adult_allowed,
        };
        let eligibility = check_eligibility(info, &membership);
        let route = select_player(url, info, &eligibility, self.platform, self.age_verified);
        self.evaluations += 1;

        info!("Routing {} ({:?}) to {}", url, info.source_type, route.name());
        self.state = SelectorState::Routed(route);
    }
}

struct Membership {
    tier: MembershipTier,
    adult_allowed: bool,
}

impl MembershipProvider for Membership {
    fn tier(&self) -> MembershipTier {
        self.tier
    }

    fn supports_adult_content(&self) -> bool {
        self.adult_allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorType;
    use crate::eligibility::can_play_video;

    const ADULT: &str = "https://www.pornhub.com/view_video.php?viewkey=abc";

    fn route(url: &str, platform: Platform) -> PlayerRoute {
        route_for(url, platform, MembershipTier::Premium, false)
    }

    fn route_for(url: &str, platform: Platform, tier: MembershipTier, age_verified: bool) -> PlayerRoute {
        let info = detect_video_source(url);
        let eligibility = can_play_video(url, &tier);
        select_player(url, &info, &eligibility, platform, age_verified)
    }

    #[test]
    fn test_ineligible_is_blocked_first() {
        let PlayerRoute::Blocked { reason } = route_for(ADULT, Platform::Android, MembershipTier::Free, true) else {
            panic!("free tier must be blocked");
        };
        assert!(reason.contains("requires premium membership"));
    }

    #[test]
    fn test_age_gate_before_playback() {
        assert!(matches!(
            route_for(ADULT, Platform::Web, MembershipTier::Pro, false),
            PlayerRoute::AgeGate
        ));
        assert!(matches!(
            route_for(ADULT, Platform::Web, MembershipTier::Pro, true),
            PlayerRoute::EmbedWebView { .. }
        ));
    }

    #[test]
    fn test_dash_per_platform() {
        let url = "https://cdn.test/manifest.mpd";
        let PlayerRoute::Blocked { reason } = route(url, Platform::Ios) else {
            panic!("DASH on iOS must be blocked");
        };
        assert_eq!(reason, DASH_IOS_MESSAGE);
        assert!(matches!(route(url, Platform::Web), PlayerRoute::DashWebView));
        assert!(matches!(route(url, Platform::Android), PlayerRoute::NativePlayer));
    }

    #[test]
    fn test_hls_native_on_mobile_webview_on_web() {
        let url = "https://cdn.test/live/master.m3u8?token=1";
        assert!(matches!(route(url, Platform::Ios), PlayerRoute::NativePlayer));
        assert!(matches!(route(url, Platform::Android), PlayerRoute::NativePlayer));
        assert!(matches!(route(url, Platform::Web), PlayerRoute::HlsWebView));
    }

    #[test]
    fn test_direct_and_audio() {
        assert!(matches!(route("https://cdn.test/a.mp4", Platform::Ios), PlayerRoute::NativePlayer));
        assert!(matches!(route("https://cdn.test/a.mp4", Platform::Web), PlayerRoute::EnhancedMp4));
        assert!(matches!(route("https://cdn.test/a.mp3", Platform::Web), PlayerRoute::NativePlayer));
    }

    #[test]
    fn test_platform_webviews() {
        let PlayerRoute::YouTubeWebView { video_id } = route("https://youtu.be/dQw4w9WgXcQ", Platform::Ios) else {
            panic!("expected YouTube");
        };
        assert_eq!(video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert!(matches!(
            route("https://vimeo.com/76979871", Platform::Android),
            PlayerRoute::VimeoWebView { .. }
        ));
    }

    #[test]
    fn test_social_gets_fallback_chain() {
        let PlayerRoute::SocialWebView(config) = route("https://x.com/nasa/status/123", Platform::Ios) else {
            panic!("expected social route");
        };
        assert_eq!(config.video_id.as_deref(), Some("123"));
        assert!(!config.embed_strategies.is_empty());
    }

    #[test]
    fn test_unsupported_and_rtmp_are_blocked_with_reason() {
        assert!(matches!(
            route("https://example.org/page", Platform::Web),
            PlayerRoute::Blocked { .. }
        ));

        let url = "rtmp://live.test/app/stream";
        let eligibility = can_play_video(url, &MembershipTier::Pro);
        assert!(!eligibility.can_play);
        let PlayerRoute::Blocked { reason } = route(url, Platform::Android) else {
            panic!("rtmp must be blocked by the gate");
        };
        assert_eq!(Some(reason), eligibility.reason);
    }

    #[test]
    fn test_youtube_pages_without_id_still_use_youtube_player() {
        for url in ["https://www.youtube.com/playlist?list=PL123", "https://www.youtube.com/@channel"] {
            let PlayerRoute::YouTubeWebView { video_id } = route_for(url, Platform::Web, MembershipTier::Free, false) else {
                panic!("expected YouTube route for {url}");
            };
            assert_eq!(video_id, None);
        }
        assert!(matches!(
            route_for("https://vimeo.com/channels/staffpicks", Platform::Ios, MembershipTier::Free, false),
            PlayerRoute::VimeoWebView { video_id: None }
        ));
    }

    #[test]
    fn test_selector_reevaluates_on_changes_only() {
        let diagnostics = Arc::new(PlayerDiagnostics::new(10));
        let mut selector = PlayerSelector::new(Platform::Web, &MembershipTier::Free, diagnostics.clone());
        assert!(matches!(selector.state(), SelectorState::Detecting));

        selector.set_url(ADULT);
        assert!(matches!(selector.route(), Some(PlayerRoute::Blocked { .. })));
        assert_eq!(selector.evaluations(), 1);

        selector.set_url(ADULT);
        selector.set_membership(&MembershipTier::Free);
        assert_eq!(selector.evaluations(), 1);

        selector.set_membership(&MembershipTier::Premium);
        assert!(matches!(selector.route(), Some(PlayerRoute::AgeGate)));

        selector.set_age_verified(true);
        assert!(matches!(selector.route(), Some(PlayerRoute::EmbedWebView { .. })));
        assert_eq!(selector.evaluations(), 3);

        selector.report_playback_error(PlayerError::new(
            ErrorType::Playback,
            ADULT,
            "Pornhub",
            "adult",
            "stalled",
        ));
        assert_eq!(selector.evaluations(), 3);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(selector.route(), Some(PlayerRoute::EmbedWebView { .. })));
    }
}
