use thiserror::Error;

use crate::voice::AsrErrorCode;

/// Errors raised while resolving a URL into a playable source
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No registered resolver claims the URL
    #[error("no resolver found for URL: {0}")]
    NoResolver(String),

    /// A resolver claimed the URL but could not extract what it needs from it.
    /// `can_resolve` and `resolve` share their pattern tables, so hitting this
    /// means the two disagree.
    #[error("Invalid {platform} URL: {url}")]
    InvalidUrl { platform: &'static str, url: String },

    /// The URL is not an absolute URI
    #[error("malformed URL {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata unavailable: {0}")]
    Metadata(String),
}

/// Errors raised while dispatching a command to a player
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no active player")]
    NoActivePlayer,

    #[error("player rejected command: {0}")]
    Dispatch(String),
}

/// Errors from the persisted settings store
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no configuration directory available")]
    NoConfigDir,
}

/// An error reported by a speech recognizer
#[derive(Debug, Clone, Error)]
#[error("speech recognition error ({code}): {message}")]
pub struct AsrError {
    pub code: AsrErrorCode,
    pub message: String,
}

impl AsrError {
    pub fn new(code: AsrErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
