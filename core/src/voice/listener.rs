use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::processor::VoiceCommandProcessor;
use super::{AsrAdapter, AsrErrorCode, AsrEvent, AsrRecovery};
use crate::config::EngineConfig;
use crate::error::AsrError;
use crate::events::{EventBus, VoiceEvent};
use crate::settings::SettingsStore;

pub const INITIAL_RESTART_BACKOFF: Duration = Duration::from_secs(1);

/// Keeps a recognizer alive and feeds its final transcripts to the processor.
///
/// Recognizers can stop without telling anyone, so the supervisor polls
/// `is_listening` every keep-alive interval and restarts a dead recognizer.
/// Restarts back off exponentially from one second up to
/// `restart_backoff_max`; a final transcript resets the backoff.
///
/// In continuous mode (always-listening on) the supervisor runs until
/// always-listening is switched off or the platform denies permission.
/// Otherwise it ends with the first recognizer session.
pub struct ListenerSupervisor {
    adapter: Arc<dyn AsrAdapter>,
    processor: Arc<VoiceCommandProcessor>,
    settings: Arc<dyn SettingsStore>,
    bus: EventBus,
    language: String,
    keepalive: Duration,
    backoff_max: Duration,
}

struct RestartState {
    backoff: Duration,
    not_before: Instant,
}

impl ListenerSupervisor {
    pub fn new(
        adapter: Arc<dyn AsrAdapter>,
        processor: Arc<VoiceCommandProcessor>,
        settings: Arc<dyn SettingsStore>,
        bus: EventBus,
        config: &EngineConfig,
    ) -> Self {
        Self {
            adapter,
            processor,
            settings,
            bus,
            language: "en".to_string(),
            keepalive: config.keepalive_interval,
            backoff_max: config.restart_backoff_max,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn spawn(self) -> ListenerHandle {
        ListenerHandle {
            handle: Some(tokio::spawn(self.run())),
        }
    }

    fn continuous(&self) -> bool {
        match self.settings.load() {
            Ok(settings) => settings.always_listening,
            Err(e) => {
                warn!("Could not read voice settings: {e}");
                false
            }
        }
    }

    async fn start(&self, events: &mpsc::UnboundedSender<AsrEvent>, restart: &mut RestartState) -> bool {
        restart.not_before = Instant::now() + restart.backoff;
        restart.backoff = (restart.backoff * 2).min(self.backoff_max);

        match self.adapter.start(&self.language, events.clone()).await {
            Ok(()) => {
                debug!("Recognizer started ({})", self.language);
                self.bus.publish(VoiceEvent::ListeningChanged { listening: true });
                true
            }
            Err(e) => {
                error!("Recognizer failed to start: {e}");
                self.bus.publish(VoiceEvent::RecognitionError {
                    code: e.code,
                    message: e.message,
                });
                false
            }
        }
    }

    async fn try_restart(&self, events: &mpsc::UnboundedSender<AsrEvent>, restart: &mut RestartState) {
        if Instant::now() < restart.not_before {
            debug!("Recognizer restart deferred by backoff");
            return;
        }
        info!("Restarting recognizer (next backoff {:?})", restart.backoff);
        self.start(events, restart).await;
    }

    async fn disable(&self, err: &AsrError) {
        warn!("Speech recognition not permitted ({}), turning always-listening off", err.code);
        if let Err(e) = self.settings.update(&mut |s| s.always_listening = false) {
            error!("Failed to persist always-listening change: {e}");
        }
        self.adapter.stop().await;
    }

    async fn run(self) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut restart = RestartState {
            backoff: INITIAL_RESTART_BACKOFF,
            not_before: Instant::now(),
        };
        let mut notified: HashSet<AsrErrorCode> = HashSet::new();

        self.start(&tx, &mut restart).await;

        let mut keepalive = tokio::time::interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(event) = rx.recv() => match event {
                    AsrEvent::Transcript(transcript) => {
                        if !transcript.is_final {
                            continue;
                        }
                        restart.backoff = INITIAL_RESTART_BACKOFF;
                        self.processor.handle_transcript(&transcript, &self.language).await;
                    }
                    AsrEvent::Error(err) => match err.code.recovery() {
                        AsrRecovery::DisableListening => {
                            self.bus.publish(VoiceEvent::RecognitionError {
                                code: err.code,
                                message: err.message.clone(),
                            });
                            self.disable(&err).await;
                            break;
                        }
                        AsrRecovery::Restart if self.continuous() => {
                            debug!("Recognizer reported {}, restarting", err.code);
                            self.adapter.stop().await;
                            self.try_restart(&tx, &mut restart).await;
                        }
                        _ => {
                            warn!("Recognizer error {}: {}", err.code, err.message);
                            if notified.insert(err.code) {
                                self.bus.publish(VoiceEvent::RecognitionError {
                                    code: err.code,
                                    message: err.message,
                                });
                            }
                        }
                    },
                    AsrEvent::Ended => debug!("Recognizer session ended"),
                },

                _ = keepalive.tick() => {
                    if self.adapter.is_listening() {
                        continue;
                    }
                    if !self.continuous() {
                        debug!("Recognizer idle and not listening continuously, stopping supervisor");
                        break;
                    }
                    warn!("Recognizer stopped silently");
                    self.try_restart(&tx, &mut restart).await;
                }
            }
        }

        self.bus.publish(VoiceEvent::ListeningChanged { listening: false });
        info!("Listener supervisor stopped");
    }
}

/// Running supervisor. Dropping the handle stops it.
pub struct ListenerHandle {
    handle: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the supervisor to stop on its own
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("Listener supervisor panicked: {e}");
                }
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
