use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use playgate_core::diagnostics::ErrorType;
use playgate_core::eligibility::check_eligibility;
use playgate_core::embed::{ChainPolicy, EmbedOutcome, EmbedTask};
use playgate_core::events::{EmbedEvent, VoiceEvent};
use playgate_core::select::SelectorState;
use playgate_core::voice::{ListenerSupervisor, ProcessOutcome};
use playgate_core::{
    ActivePlayer, EmbedFallbackChain, EngineConfig, Event, EventBus, JsonSettingsStore, MembershipTier, Platform,
    PlayerDiagnostics, PlayerError, PlayerRoute, PlayerSelector, SettingsStore, SourceParserService,
    VoiceCommandProcessor, get_social_media_config,
};
use serde_json::json;
use tokio::sync::mpsc;

use crate::asr::StdinAsr;
use crate::commands::{CommandHandler, CommandResult};
use crate::console::ConsolePlayer;
use crate::probe::HttpEmbedLoader;

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

// App state
pub struct App {
    /// Engine tunables, read from `PLAYGATE_*` variables
    pub config: EngineConfig,
    /// URL → playable source
    pub parser: SourceParserService,
    /// Playback and embed failures for this run
    pub diagnostics: Arc<PlayerDiagnostics>,
    /// Events from the embed chain and the voice pipeline
    pub bus: EventBus,
    /// Persisted voice settings
    pub settings: Arc<dyn SettingsStore>,
    /// Stand-in for a video surface
    pub player: Arc<ConsolePlayer>,
    /// Registry the voice pipeline dispatches to
    pub active: ActivePlayer,
    pub processor: Arc<VoiceCommandProcessor>,
}

impl App {
    pub fn new(settings_path: Option<PathBuf>) -> Result<Self> {
        let config = EngineConfig::from_env();
        let settings: Arc<dyn SettingsStore> = match settings_path {
            Some(path) => Arc::new(JsonSettingsStore::new(path)),
            None => Arc::new(JsonSettingsStore::default_location().context("No settings location available")?),
        };
        let bus = EventBus::default();

        let player = Arc::new(ConsolePlayer::new());
        let active = ActivePlayer::new();
        active.set(player.clone());
        let processor = Arc::new(VoiceCommandProcessor::new(active.clone(), settings.clone(), bus.clone()));

        Ok(Self {
            parser: SourceParserService::new(&config),
            diagnostics: Arc::new(PlayerDiagnostics::from(&config)),
            config,
            bus,
            settings,
            player,
            active,
            processor,
        })
    }

    pub fn set_status(&self, message: impl Into<String>, level: StatusLevel) {
        let marker = match level {
            StatusLevel::Info => "·",
            StatusLevel::Success => "✓",
            StatusLevel::Warning => "!",
            StatusLevel::Error => "✗",
        };
        eprintln!("{marker} {}", message.into());
    }

    pub fn detect(&self, url: &str, tier: &str, platform: Platform, age_verified: bool) -> Result<()> {
        let tier = MembershipTier::parse(tier);
        let mut selector = PlayerSelector::new(platform, &tier, self.diagnostics.clone());
        selector.set_age_verified(age_verified);
        if let SelectorState::Detecting = selector.set_url(url) {
            return Err(anyhow!("No route selected for {url}"));
        }
        let route = selector.route().ok_or_else(|| anyhow!("No route selected for {url}"))?;
        let eligibility = selector.source_info().map(|info| check_eligibility(info, &tier));

        let report = json!({
            "url": url,
            "tier": tier.as_str(),
            "source": selector.source_info(),
            "eligibility": eligibility,
            "route": route.name(),
            "detail": route_detail(route),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);

        match route {
            PlayerRoute::Blocked { reason } => self.set_status(reason.clone(), StatusLevel::Warning),
            PlayerRoute::Unsupported { reason } => self.set_status(reason.clone(), StatusLevel::Error),
            PlayerRoute::AgeGate => self.set_status("Age verification required", StatusLevel::Warning),
            _ => self.set_status(format!("Playable via {}", route.name()), StatusLevel::Success),
        }
        Ok(())
    }

    pub async fn resolve(&self, url: &str, with_metadata: bool) -> Result<()> {
        let source = match self.parser.parse(url).await {
            Ok(source) => source,
            Err(e) => {
                let platform = self.parser.get_platform(url).unwrap_or("unknown");
                self.diagnostics.log_error(PlayerError::new(
                    ErrorType::Unsupported,
                    url,
                    platform,
                    "unknown",
                    e.to_string(),
                ));
                return Err(e).with_context(|| format!("Could not resolve {url}"));
            }
        };

        let metadata = if with_metadata {
            match self.parser.fetch_metadata(url).await {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    self.set_status(format!("Metadata unavailable: {e}"), StatusLevel::Warning);
                    None
                }
            }
        } else {
            None
        };

        let report = json!({ "source": source, "metadata": metadata });
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    pub async fn embed(&self, url: &str, probe: bool) -> Result<()> {
        let config = get_social_media_config(url).ok_or_else(|| anyhow!("{url} is not a Twitter, Instagram or TikTok post"))?;

        let strategies: Vec<_> = config
            .embed_strategies
            .iter()
            .map(|strategy| {
                json!({
                    "name": strategy.name,
                    "priority": strategy.priority,
                    "embedUrl": strategy.embed_url(&config.url, config.video_id.as_deref()),
                    "userAgent": strategy.user_agent,
                })
            })
            .collect();
        let report = json!({
            "platform": config.platform.as_str(),
            "videoId": config.video_id,
            "strategies": strategies,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);

        if !probe {
            return Ok(());
        }

        let platform = config.platform;
        let policy = ChainPolicy::from(&self.config);
        let chain = EmbedFallbackChain::new(config, policy).with_events(self.bus.clone());
        let loader = Arc::new(HttpEmbedLoader::new(self.config.http_client()));

        let mut events = self.bus.subscribe();
        let started = Instant::now();
        let task = EmbedTask::spawn(chain, loader);
        let mut join = std::pin::pin!(task.join());

        let outcome = loop {
            tokio::select! {
                result = &mut join => break result,
                Ok(event) = events.recv() => self.report_embed_event(url, &event),
            }
        };
        // Drain what was published before the task finished
        while let Ok(event) = events.try_recv() {
            self.report_embed_event(url, &event);
        }

        let Some((chain, outcome)) = outcome else {
            return Err(anyhow!("Embed probe was cancelled"));
        };
        let elapsed = started.elapsed().as_millis() as u64;
        match outcome {
            EmbedOutcome::Loaded(attempt) => {
                self.set_status(
                    format!("Loaded {} via {} in {elapsed} ms", platform, attempt.strategy),
                    StatusLevel::Success,
                );
            }
            EmbedOutcome::Failed(failure) => {
                self.set_status(failure.message(), StatusLevel::Error);
                debug!("Chain state after failure: {:?}", chain.state());
            }
        }
        self.print_diagnostics()
    }

    fn report_embed_event(&self, url: &str, event: &Event) {
        let Event::Embed(event) = event else {
            return;
        };
        match event {
            EmbedEvent::Attempt { strategy, index, .. } => {
                self.set_status(format!("Trying {strategy} (#{})", index + 1), StatusLevel::Info);
            }
            EmbedEvent::Failed {
                platform,
                strategy,
                http_status,
                message,
            } => {
                self.set_status(format!("{strategy} failed: {message}"), StatusLevel::Warning);
                let mut error = PlayerError::new(
                    if http_status.is_some() { ErrorType::Http } else { ErrorType::EmbedLoad },
                    url,
                    platform.as_str(),
                    "social",
                    message.clone(),
                )
                .with_embed_method(*strategy);
                if let Some(status) = http_status {
                    error = error.with_http_status(*status);
                }
                self.diagnostics.log_error(error);
            }
            EmbedEvent::Succeeded { strategy, .. } => {
                self.set_status(format!("{strategy} loaded"), StatusLevel::Success);
            }
            EmbedEvent::Exhausted { attempted, total, .. } => {
                self.set_status(format!("Gave up after {attempted}/{total} strategies"), StatusLevel::Warning);
            }
        }
    }

    fn print_diagnostics(&self) -> Result<()> {
        if self.diagnostics.is_empty() {
            return Ok(());
        }
        for pattern in self.diagnostics.detect_patterns() {
            self.set_status(pattern.description(), StatusLevel::Warning);
        }
        println!("{}", self.diagnostics.export_json()?);
        Ok(())
    }

    pub async fn voice(&self, text: &str, language: &str, confidence: f32, auto_confirm: bool) -> Result<()> {
        let mut outcome = self.processor.process(text, language, confidence).await;
        if auto_confirm && matches!(outcome, ProcessOutcome::ConfirmationRequested(_)) {
            if let Some(confirmed) = self.processor.confirm().await {
                outcome = confirmed;
            }
        }
        self.report_outcome(&outcome);
        println!("{}", serde_json::to_string_pretty(&self.player.snapshot())?);
        Ok(())
    }

    pub fn report_outcome(&self, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Executed(payload) => {
                self.set_status(format!("{} → {}", payload.intent, payload.action), StatusLevel::Success);
            }
            ProcessOutcome::ConfirmationRequested(command) => self.set_status(
                format!(
                    "Did you mean \"{}\"? ({:.0}% sure, :confirm or :cancel)",
                    command.command_type,
                    command.confidence * 100.0
                ),
                StatusLevel::Info,
            ),
            ProcessOutcome::RetryRequested => self.set_status("Sorry, please say that again", StatusLevel::Warning),
            ProcessOutcome::NotUnderstood => self.set_status("Command not recognised", StatusLevel::Warning),
            ProcessOutcome::Failed(reason) => self.set_status(reason.clone(), StatusLevel::Error),
        }
    }

    pub async fn listen(&self, language: &str) -> Result<()> {
        let continuous = self.settings.load()?.always_listening;
        let (commands_tx, mut commands) = mpsc::unbounded_channel();
        let asr = Arc::new(StdinAsr::spawn(commands_tx, !continuous));

        let mut events = self.bus.subscribe();
        let mut handle = ListenerSupervisor::new(
            asr,
            self.processor.clone(),
            self.settings.clone(),
            self.bus.clone(),
            &self.config,
        )
        .with_language(language)
        .spawn();

        self.set_status(
            format!(
                "Listening ({language}, {}). Type to speak, :help for commands",
                if continuous { "continuous" } else { "single utterance" }
            ),
            StatusLevel::Info,
        );

        loop {
            tokio::select! {
                Some(line) = commands.recv() => {
                    match CommandHandler::execute(self, &line).await {
                        Ok(CommandResult::Continue) => {}
                        Ok(CommandResult::Quit) => break,
                        Err(e) => self.set_status(format!("{e:#}"), StatusLevel::Error),
                    }
                }
                Ok(event) = events.recv() => {
                    if !self.report_voice_event(&event) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        handle.stop();
        Ok(())
    }

    /// Returns false once the listener has stopped for good
    fn report_voice_event(&self, event: &Event) -> bool {
        let Event::Voice(event) = event else {
            return true;
        };
        match event {
            VoiceEvent::Executed { command } => {
                self.set_status(format!("Executed {}", command.command_type), StatusLevel::Success);
            }
            VoiceEvent::ConfirmationRequested { command } => {
                self.set_status(
                    format!("Did you mean \"{}\"? (:confirm or :cancel)", command.command_type),
                    StatusLevel::Info,
                );
            }
            VoiceEvent::RetryRequested { .. } => self.set_status("Sorry, please say that again", StatusLevel::Warning),
            VoiceEvent::ExecutionFailed { reason, .. } => self.set_status(reason.clone(), StatusLevel::Error),
            VoiceEvent::NotUnderstood { text, .. } => {
                self.set_status(format!("Not understood: {text}"), StatusLevel::Warning);
            }
            VoiceEvent::RecognitionError { code, message } => {
                self.set_status(format!("Recognizer error {code}: {message}"), StatusLevel::Error);
            }
            VoiceEvent::ListeningChanged { listening: true } => debug!("Recognizer listening"),
            VoiceEvent::ListeningChanged { listening: false } => {
                self.set_status("Stopped listening", StatusLevel::Info);
                return false;
            }
        }
        true
    }

    pub fn settings(&self, always_listening: Option<bool>) -> Result<()> {
        let settings = match always_listening {
            Some(enabled) => self.settings.update(&mut |s| s.always_listening = enabled)?,
            None => self.settings.load()?,
        };
        println!("{}", serde_json::to_string_pretty(&settings)?);
        Ok(())
    }
}

fn route_detail(route: &PlayerRoute) -> serde_json::Value {
    match route {
        PlayerRoute::Blocked { reason } | PlayerRoute::Unsupported { reason } => json!({ "reason": reason }),
        PlayerRoute::YouTubeWebView { video_id } | PlayerRoute::VimeoWebView { video_id } => {
            json!({ "videoId": video_id })
        }
        PlayerRoute::EmbedWebView { platform } => json!({ "platform": platform }),
        PlayerRoute::SocialWebView(config) => json!({
            "platform": config.platform.as_str(),
            "videoId": config.video_id,
            "strategies": config.embed_strategies.iter().map(|s| s.name).collect::<Vec<_>>(),
        }),
        _ => serde_json::Value::Null,
    }
}
