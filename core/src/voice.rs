//! Voice control: transcript parsing, the confidence gate, command execution
//! and the always-listening supervisor.

mod gate;
mod listener;
mod parser;
mod patterns;
mod processor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AsrError;

pub use gate::{CONFIRM_THRESHOLD, GateDecision, RETRY_THRESHOLD, gate};
pub use listener::{INITIAL_RESTART_BACKOFF, ListenerHandle, ListenerSupervisor};
pub use parser::parse_voice_command;
pub use patterns::{SUPPORTED_LANGUAGES, resolve_language};
pub use processor::{ProcessOutcome, UsageRecord, UsageReporter, VoiceCommandProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCommandType {
    Play,
    Pause,
    Stop,
    SeekForward,
    SeekBackward,
    JumpTo,
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    SpeedUp,
    SpeedDown,
    SpeedNormal,
    Fullscreen,
    ExitFullscreen,
    Replay,
    Next,
    Previous,
    AddBookmark,
    GoToBookmark,
    Unknown,
}

impl VoiceCommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCommandType::Play => "play",
            VoiceCommandType::Pause => "pause",
            VoiceCommandType::Stop => "stop",
            VoiceCommandType::SeekForward => "seek_forward",
            VoiceCommandType::SeekBackward => "seek_backward",
            VoiceCommandType::JumpTo => "jump_to",
            VoiceCommandType::VolumeUp => "volume_up",
            VoiceCommandType::VolumeDown => "volume_down",
            VoiceCommandType::Mute => "mute",
            VoiceCommandType::Unmute => "unmute",
            VoiceCommandType::SpeedUp => "speed_up",
            VoiceCommandType::SpeedDown => "speed_down",
            VoiceCommandType::SpeedNormal => "speed_normal",
            VoiceCommandType::Fullscreen => "fullscreen",
            VoiceCommandType::ExitFullscreen => "exit_fullscreen",
            VoiceCommandType::Replay => "replay",
            VoiceCommandType::Next => "next",
            VoiceCommandType::Previous => "previous",
            VoiceCommandType::AddBookmark => "add_bookmark",
            VoiceCommandType::GoToBookmark => "go_to_bookmark",
            VoiceCommandType::Unknown => "unknown",
        }
    }

    /// Whether the command carries a numeric value
    pub fn takes_value(&self) -> bool {
        matches!(
            self,
            VoiceCommandType::SeekForward
                | VoiceCommandType::SeekBackward
                | VoiceCommandType::JumpTo
                | VoiceCommandType::VolumeUp
                | VoiceCommandType::VolumeDown
                | VoiceCommandType::SpeedUp
                | VoiceCommandType::SpeedDown
        )
    }
}

impl std::fmt::Display for VoiceCommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of parsing one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedVoiceCommand {
    #[serde(rename = "type")]
    pub command_type: VoiceCommandType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_name: Option<String>,
    /// Supplied by the recognizer, never computed here
    pub confidence: f32,
    pub original_text: String,
    pub language: String,
}

impl ParsedVoiceCommand {
    pub fn is_unknown(&self) -> bool {
        self.command_type == VoiceCommandType::Unknown
    }
}

/// One recognition result from an ASR adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    pub is_final: bool,
}

impl Transcript {
    pub fn final_result(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
            is_final: true,
        }
    }
}

/// Error codes a recognizer may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AsrErrorCode {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    BadGrammar,
    LanguageNotSupported,
    Other,
}

/// What the listener does after a recognizer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsrRecovery {
    /// Permission denied: turn always-listening off until the user re-enables it
    DisableListening,
    /// Restart the recognizer when listening continuously
    Restart,
    /// Tell the user once
    Notify,
}

impl AsrErrorCode {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => AsrErrorCode::NoSpeech,
            "aborted" => AsrErrorCode::Aborted,
            "audio-capture" => AsrErrorCode::AudioCapture,
            "network" => AsrErrorCode::Network,
            "not-allowed" => AsrErrorCode::NotAllowed,
            "service-not-allowed" => AsrErrorCode::ServiceNotAllowed,
            "bad-grammar" => AsrErrorCode::BadGrammar,
            "language-not-supported" => AsrErrorCode::LanguageNotSupported,
            _ => AsrErrorCode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AsrErrorCode::NoSpeech => "no-speech",
            AsrErrorCode::Aborted => "aborted",
            AsrErrorCode::AudioCapture => "audio-capture",
            AsrErrorCode::Network => "network",
            AsrErrorCode::NotAllowed => "not-allowed",
            AsrErrorCode::ServiceNotAllowed => "service-not-allowed",
            AsrErrorCode::BadGrammar => "bad-grammar",
            AsrErrorCode::LanguageNotSupported => "language-not-supported",
            AsrErrorCode::Other => "other",
        }
    }

    pub fn recovery(&self) -> AsrRecovery {
        match self {
            AsrErrorCode::NotAllowed | AsrErrorCode::ServiceNotAllowed => AsrRecovery::DisableListening,
            AsrErrorCode::NoSpeech | AsrErrorCode::Network => AsrRecovery::Restart,
            _ => AsrRecovery::Notify,
        }
    }
}

impl std::fmt::Display for AsrErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events pushed by a recognizer while it runs
#[derive(Debug, Clone)]
pub enum AsrEvent {
    Transcript(Transcript),
    Error(AsrError),
    /// The recognizer stopped on its own
    Ended,
}

/// A platform speech recognizer.
///
/// Recognizers may stop without sending [`AsrEvent::Ended`]; the listener
/// supervisor polls [`AsrAdapter::is_listening`] to notice.
#[async_trait]
pub trait AsrAdapter: Send + Sync {
    async fn start(&self, language: &str, events: mpsc::UnboundedSender<AsrEvent>) -> Result<(), AsrError>;

    async fn stop(&self);

    fn is_listening(&self) -> bool;
}
