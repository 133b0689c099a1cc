//! Bounded player error history and recurring-failure detection.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

const REPEATED_TYPE_THRESHOLD: usize = 3;
const PLATFORM_THRESHOLD: usize = 3;
const EMBED_METHOD_THRESHOLD: usize = 2;
const HTTP_STATUS_THRESHOLD: usize = 2;
const SLOW_LOAD_THRESHOLD: usize = 3;
const SLOW_LOAD_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    EmbedLoad,
    Http,
    Network,
    Timeout,
    Playback,
    Unsupported,
    Permission,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::EmbedLoad => "embed_load",
            ErrorType::Http => "http",
            ErrorType::Network => "network",
            ErrorType::Timeout => "timeout",
            ErrorType::Playback => "playback",
            ErrorType::Unsupported => "unsupported",
            ErrorType::Permission => "permission",
            ErrorType::Unknown => "unknown",
        }
    }
}

/// One recorded playback failure. Never modified once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerError {
    pub timestamp: DateTime<Utc>,
    pub error_type: ErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub platform: String,
    pub source_type: String,
    pub retry_count: u32,
    pub max_retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub user_agent: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_method: Option<String>,
}

impl PlayerError {
    pub fn new(
        error_type: ErrorType,
        url: impl Into<String>,
        platform: impl Into<String>,
        source_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            error_type,
            error_code: None,
            url: url.into(),
            video_id: None,
            platform: platform.into(),
            source_type: source_type.into(),
            retry_count: 0,
            max_retries: 0,
            load_duration_ms: None,
            http_status: None,
            user_agent: String::new(),
            error_message: message.into(),
            embed_method: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self
    }

    pub fn with_retries(mut self, retry_count: u32, max_retries: u32) -> Self {
        self.retry_count = retry_count;
        self.max_retries = max_retries;
        self
    }

    pub fn with_load_duration_ms(mut self, ms: u64) -> Self {
        self.load_duration_ms = Some(ms);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_embed_method(mut self, method: impl Into<String>) -> Self {
        self.embed_method = Some(method.into());
        self
    }
}

/// A recurring failure mode found in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum ErrorPattern {
    RepeatedErrorType { error_type: ErrorType, count: usize },
    PlatformFailures { platform: String, count: usize },
    FailingEmbedMethod { method: String, count: usize },
    HttpStatusCluster { status: u16, count: usize },
    SlowLoads { count: usize },
}

impl ErrorPattern {
    pub fn description(&self) -> String {
        match self {
            ErrorPattern::RepeatedErrorType { error_type, count } => {
                format!("{} errors occurred {count} times", error_type.as_str())
            }
            ErrorPattern::PlatformFailures { platform, count } => {
                format!("{platform} failed {count} times")
            }
            ErrorPattern::FailingEmbedMethod { method, count } => {
                format!("embed method {method} failed {count} times")
            }
            ErrorPattern::HttpStatusCluster { status, count } => {
                format!("HTTP {status} returned {count} times")
            }
            ErrorPattern::SlowLoads { count } => {
                format!("{count} loads took longer than {}s", SLOW_LOAD_MS / 1000)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_platform: BTreeMap<String, usize>,
}

/// In-memory ring buffer of [`PlayerError`]s.
///
/// Logging never blocks on I/O; once full, the oldest record is dropped.
#[derive(Debug)]
pub struct PlayerDiagnostics {
    capacity: usize,
    errors: Mutex<VecDeque<PlayerError>>,
}

impl Default for PlayerDiagnostics {
    fn default() -> Self {
        Self::new(EngineConfig::default().diagnostics_capacity)
    }
}

impl From<&EngineConfig> for PlayerDiagnostics {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.diagnostics_capacity)
    }
}

impl PlayerDiagnostics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            errors: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn log_error(&self, error: PlayerError) {
        warn!(
            "[{}] {} on {} ({}): {}",
            error.error_type.as_str(),
            error.source_type,
            error.platform,
            error.url,
            error.error_message
        );

        let mut errors = self.errors.lock();
        if errors.len() == self.capacity {
            errors.pop_front();
        }
        errors.push_back(error);
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Every stored record, oldest first
    pub fn all(&self) -> Vec<PlayerError> {
        self.errors.lock().iter().cloned().collect()
    }

    /// The last `n` records, oldest first
    pub fn recent(&self, n: usize) -> Vec<PlayerError> {
        let errors = self.errors.lock();
        errors.iter().skip(errors.len().saturating_sub(n)).cloned().collect()
    }

    pub fn clear(&self) {
        self.errors.lock().clear();
    }

    pub fn detect_patterns(&self) -> Vec<ErrorPattern> {
        let errors = self.errors.lock();
        let mut patterns = Vec::new();

        for (error_type, count) in tally(errors.iter().map(|e| e.error_type)) {
            if count >= REPEATED_TYPE_THRESHOLD {
                patterns.push(ErrorPattern::RepeatedErrorType { error_type, count });
            }
        }

        for (platform, count) in tally(errors.iter().map(|e| e.platform.clone())) {
            if count >= PLATFORM_THRESHOLD {
                patterns.push(ErrorPattern::PlatformFailures { platform, count });
            }
        }

        for (method, count) in tally(errors.iter().filter_map(|e| e.embed_method.clone())) {
            if count >= EMBED_METHOD_THRESHOLD {
                patterns.push(ErrorPattern::FailingEmbedMethod { method, count });
            }
        }

        let statuses = errors
            .iter()
            .filter_map(|e| e.http_status)
            .filter(|s| (400..600).contains(s));
        for (status, count) in tally(statuses) {
            if count >= HTTP_STATUS_THRESHOLD {
                patterns.push(ErrorPattern::HttpStatusCluster { status, count });
            }
        }

        let slow = errors
            .iter()
            .filter(|e| e.load_duration_ms.is_some_and(|ms| ms > SLOW_LOAD_MS))
            .count();
        if slow >= SLOW_LOAD_THRESHOLD {
            patterns.push(ErrorPattern::SlowLoads { count: slow });
        }

        patterns
    }

    pub fn summary(&self) -> DiagnosticsSummary {
        let errors = self.errors.lock();
        let mut summary = DiagnosticsSummary {
            total: errors.len(),
            ..Default::default()
        };
        for error in errors.iter() {
            *summary.by_type.entry(error.error_type.as_str().to_string()).or_default() += 1;
            *summary.by_platform.entry(error.platform.clone()).or_default() += 1;
        }
        summary
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.errors.lock())
    }
}

/// Counts per key, sorted by key for stable output
fn tally<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Ord,
    I: Iterator<Item = K>,
{
    let mut counts: HashMap<K, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| a.0.cmp(&b.0));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(n: usize) -> PlayerError {
        PlayerError::new(
            ErrorType::Network,
            format!("https://cdn.test/{n}.mp4"),
            "direct",
            "direct",
            format!("failure {n}"),
        )
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let diagnostics = PlayerDiagnostics::new(100);
        for n in 0..105 {
            diagnostics.log_error(error(n));
        }

        let all = diagnostics.all();
        assert_eq!(all.len(), 100);
        assert_eq!(all.first().unwrap().error_message, "failure 5");
        assert_eq!(all.last().unwrap().error_message, "failure 104");
        assert!(all.iter().all(|e| e.error_message != "failure 4"));

        let messages: Vec<_> = all.iter().map(|e| e.error_message.clone()).collect();
        let expected: Vec<_> = (5..105).map(|n| format!("failure {n}")).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_recent_keeps_order() {
        let diagnostics = PlayerDiagnostics::new(10);
        for n in 0..4 {
            diagnostics.log_error(error(n));
        }
        let recent: Vec<_> = diagnostics.recent(2).into_iter().map(|e| e.error_message).collect();
        assert_eq!(recent, vec!["failure 2", "failure 3"]);
        assert_eq!(diagnostics.recent(50).len(), 4);
    }

    #[test]
    fn test_detects_patterns() {
        let diagnostics = PlayerDiagnostics::default();
        for n in 0..3 {
            diagnostics.log_error(
                PlayerError::new(ErrorType::EmbedLoad, "https://x.com/a/status/1", "twitter", "social", "blocked")
                    .with_embed_method("twitframe")
                    .with_http_status(403)
                    .with_load_duration_ms(12_000 + n),
            );
        }
        diagnostics.log_error(error(0).with_http_status(302));

        let patterns = diagnostics.detect_patterns();
        assert!(patterns.contains(&ErrorPattern::RepeatedErrorType {
            error_type: ErrorType::EmbedLoad,
            count: 3
        }));
        assert!(patterns.contains(&ErrorPattern::PlatformFailures {
            platform: "twitter".into(),
            count: 3
        }));
        assert!(patterns.contains(&ErrorPattern::FailingEmbedMethod {
            method: "twitframe".into(),
            count: 3
        }));
        assert!(patterns.contains(&ErrorPattern::HttpStatusCluster { status: 403, count: 3 }));
        assert!(patterns.contains(&ErrorPattern::SlowLoads { count: 3 }));
        assert!(!patterns.iter().any(|p| matches!(p, ErrorPattern::HttpStatusCluster { status: 302, .. })));
    }

    #[test]
    fn test_quiet_history_has_no_patterns() {
        let diagnostics = PlayerDiagnostics::default();
        diagnostics.log_error(error(1));
        diagnostics.log_error(error(2).with_http_status(500));
        assert!(diagnostics.detect_patterns().is_empty());
    }

    #[test]
    fn test_summary_and_export() {
        let diagnostics = PlayerDiagnostics::default();
        diagnostics.log_error(error(1));
        diagnostics.log_error(PlayerError::new(ErrorType::Http, "https://v.test/", "vimeo", "vimeo", "gone"));

        let summary = diagnostics.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_type.get("network"), Some(&1));
        assert_eq!(summary.by_platform.get("vimeo"), Some(&1));

        let exported: serde_json::Value = serde_json::from_str(&diagnostics.export_json().unwrap()).unwrap();
        assert_eq!(exported.as_array().unwrap().len(), 2);
        assert_eq!(exported[1]["errorType"], "http");

        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }
}
