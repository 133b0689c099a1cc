use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use super::gate::{GateDecision, gate};
use super::parser::parse_voice_command;
use super::{ParsedVoiceCommand, Transcript};
use crate::control::{ActivePlayer, ControlPayload, dispatch};
use crate::error::ControlError;
use crate::events::{EventBus, VoiceEvent};
use crate::settings::SettingsStore;

/// Usage record sent to the quota/log backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub command_text: String,
    pub command_type: String,
    pub confidence_score: f32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Backend that accounts voice usage. Called off the command path; errors
/// are logged and never affect execution.
#[async_trait]
pub trait UsageReporter: Send + Sync {
    async fn report(&self, record: UsageRecord) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Executed(ControlPayload),
    ConfirmationRequested(ParsedVoiceCommand),
    RetryRequested,
    NotUnderstood,
    Failed(String),
}

/// Parse → gate → execute pipeline for final transcripts.
///
/// Executions are serialised so two commands never interleave against the
/// same player. At most one command waits for confirmation; a newer one
/// replaces it.
pub struct VoiceCommandProcessor {
    player: ActivePlayer,
    settings: Arc<dyn SettingsStore>,
    reporter: Option<Arc<dyn UsageReporter>>,
    bus: EventBus,
    pending: Mutex<Option<ParsedVoiceCommand>>,
    exec: AsyncMutex<()>,
}

impl VoiceCommandProcessor {
    pub fn new(player: ActivePlayer, settings: Arc<dyn SettingsStore>, bus: EventBus) -> Self {
        Self {
            player,
            settings,
            reporter: None,
            bus,
            pending: Mutex::new(None),
            exec: AsyncMutex::new(()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn UsageReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn player(&self) -> &ActivePlayer {
        &self.player
    }

    pub fn pending(&self) -> Option<ParsedVoiceCommand> {
        self.pending.lock().clone()
    }

    /// Handle a recognizer result. Interim results are ignored.
    pub async fn handle_transcript(&self, transcript: &Transcript, language: &str) -> Option<ProcessOutcome> {
        if !transcript.is_final {
            return None;
        }
        Some(self.process(&transcript.text, language, transcript.confidence).await)
    }

    pub async fn process(&self, text: &str, language: &str, confidence: f32) -> ProcessOutcome {
        let command = parse_voice_command(text, language, confidence);
        if command.is_unknown() {
            info!("Voice command not understood: {text:?}");
            self.bus.publish(VoiceEvent::NotUnderstood {
                text: text.to_string(),
                language: command.language,
            });
            return ProcessOutcome::NotUnderstood;
        }

        match gate(confidence) {
            GateDecision::Retry => {
                debug!("Confidence {confidence:.2} too low for {}", command.command_type);
                self.bus.publish(VoiceEvent::RetryRequested {
                    text: text.to_string(),
                    confidence,
                });
                ProcessOutcome::RetryRequested
            }
            GateDecision::Confirm => {
                debug!("Awaiting confirmation for {} ({confidence:.2})", command.command_type);
                *self.pending.lock() = Some(command.clone());
                self.bus.publish(VoiceEvent::ConfirmationRequested {
                    command: command.clone(),
                });
                ProcessOutcome::ConfirmationRequested(command)
            }
            GateDecision::Execute => self.execute(command).await,
        }
    }

    /// Run the command waiting for confirmation, if any
    pub async fn confirm(&self) -> Option<ProcessOutcome> {
        let command = self.pending.lock().take()?;
        Some(self.execute(command).await)
    }

    pub fn cancel(&self) -> Option<ParsedVoiceCommand> {
        self.pending.lock().take()
    }

    async fn execute(&self, command: ParsedVoiceCommand) -> ProcessOutcome {
        let _turn = self.exec.lock().await;

        let result = match self.player.current() {
            Some(player) => dispatch(player.as_ref(), &command)
                .map_err(|e| ControlError::Dispatch(format!("{e:#}"))),
            None => Err(ControlError::NoActivePlayer),
        };

        match result {
            Ok(payload) => {
                info!("Executed voice command {} ({})", command.command_type, command.original_text);
                if let Err(e) = self.settings.update(&mut |s| s.usage_count += 1) {
                    warn!("Failed to persist voice usage count: {e}");
                }
                self.report(&command, None);
                self.bus.publish(VoiceEvent::Executed { command });
                ProcessOutcome::Executed(payload)
            }
            Err(e) => {
                warn!("Voice command {} failed: {e}", command.command_type);
                let reason = e.to_string();
                self.report(&command, Some(reason.clone()));
                self.bus.publish(VoiceEvent::ExecutionFailed {
                    command,
                    reason: reason.clone(),
                });
                ProcessOutcome::Failed(reason)
            }
        }
    }

    fn report(&self, command: &ParsedVoiceCommand, error: Option<String>) {
        let Some(reporter) = self.reporter.clone() else {
            return;
        };
        let record = UsageRecord {
            command_text: command.original_text.clone(),
            command_type: command.command_type.to_string(),
            confidence_score: command.confidence,
            success: error.is_none(),
            error_message: error,
        };
        tokio::spawn(async move {
            if let Err(e) = reporter.report(record).await {
                warn!("Voice usage report failed: {e:#}");
            }
        });
    }
}
