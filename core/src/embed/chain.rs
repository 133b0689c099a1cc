use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::task::JoinHandle;

use super::SocialMediaConfig;
use crate::config::EngineConfig;
use crate::events::{EmbedEvent, EventBus};

/// Retry limits for the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPolicy {
    /// Maximum automatic embed loads per round
    pub max_retries: usize,
    /// Maximum user-triggered restarts
    pub max_manual_retries: usize,
    /// Delay before advancing after a failed load
    pub backoff: Duration,
}

impl Default for ChainPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ChainPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.embed_max_retries,
            max_manual_retries: config.manual_max_retries,
            backoff: config.embed_backoff,
        }
    }
}

/// An embed URL ready to be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAttempt {
    /// Position of the strategy in the platform table
    pub index: usize,
    pub strategy: &'static str,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub user_agent: Option<&'static str>,
}

/// Why an embed failed to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFailure {
    pub http_status: Option<u16>,
    pub message: String,
}

impl EmbedFailure {
    pub fn load_error(message: impl Into<String>) -> Self {
        Self {
            http_status: None,
            message: message.into(),
        }
    }

    /// A failure for statuses of 400 and above, `None` otherwise
    pub fn from_http_status(status: u16) -> Option<Self> {
        (status >= 400).then(|| Self {
            http_status: Some(status),
            message: format!("HTTP {status}"),
        })
    }
}

/// Terminal failure of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainFailure {
    /// Embeds actually loaded in this round
    pub attempted: usize,
    /// Strategies configured for the platform
    pub total: usize,
}

impl ChainFailure {
    pub fn message(&self) -> String {
        format!(
            "Unable to load this post (tried {}/{} methods)",
            self.attempted, self.total
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    Loading(EmbedAttempt),
    /// Waiting out the backoff before the next strategy
    Backoff,
    Succeeded(EmbedAttempt),
    Failed(ChainFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    Load(EmbedAttempt),
    /// An embed already loaded; the chain stays settled
    Done(EmbedAttempt),
    Exhausted(ChainFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    RetryAfter(Duration),
    Exhausted(ChainFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    Loaded(EmbedAttempt),
    Failed(ChainFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Maximum retry attempts reached ({max})")]
pub struct ManualRetryError {
    pub max: usize,
}

/// Loads an embed URL, typically in a WebView
#[async_trait]
pub trait EmbedLoader: Send + Sync {
    async fn load(&self, attempt: &EmbedAttempt) -> Result<(), EmbedFailure>;
}

/// Walks a platform's strategies in priority order, one at a time.
///
/// Strategies that cannot build a URL are skipped without using the retry
/// budget. A failed load waits out the backoff and advances. The round ends
/// on success, after `max_retries` loads, or when no strategy is left.
#[derive(Debug, Clone)]
pub struct EmbedFallbackChain {
    config: SocialMediaConfig,
    policy: ChainPolicy,
    next_index: usize,
    attempts: usize,
    manual_retries: usize,
    state: ChainState,
    bus: Option<EventBus>,
}

impl EmbedFallbackChain {
    pub fn new(config: SocialMediaConfig, policy: ChainPolicy) -> Self {
        Self {
            config,
            policy,
            next_index: 0,
            attempts: 0,
            manual_retries: 0,
            state: ChainState::Idle,
            bus: None,
        }
    }

    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn config(&self) -> &SocialMediaConfig {
        &self.config
    }

    /// Loads made in the current round
    pub fn attempted(&self) -> usize {
        self.attempts
    }

    pub fn manual_retries(&self) -> usize {
        self.manual_retries
    }

    pub fn can_manual_retry(&self) -> bool {
        self.manual_retries < self.policy.max_manual_retries
    }

    fn publish(&self, event: EmbedEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }

    fn build(&self, index: usize) -> Option<EmbedAttempt> {
        let strategy = self.config.embed_strategies.get(index)?;
        let url = strategy.embed_url(&self.config.url, self.config.video_id.as_deref())?;
        Some(EmbedAttempt {
            index,
            strategy: strategy.name,
            url,
            headers: strategy.header_map(),
            user_agent: strategy.user_agent,
        })
    }

    fn has_remaining(&self) -> bool {
        (self.next_index..self.config.embed_strategies.len()).any(|i| self.build(i).is_some())
    }

    fn exhaust(&mut self) -> ChainFailure {
        let failure = ChainFailure {
            attempted: self.attempts,
            total: self.config.embed_strategies.len(),
        };
        warn!(
            "All {} embed methods failed for {} ({} attempted)",
            self.config.platform, self.config.url, failure.attempted
        );
        self.state = ChainState::Failed(failure);
        self.publish(EmbedEvent::Exhausted {
            platform: self.config.platform,
            attempted: failure.attempted,
            total: failure.total,
        });
        failure
    }

    /// Next embed to load, skipping strategies that cannot build a URL
    pub fn next_attempt(&mut self) -> ChainStep {
        match &self.state {
            ChainState::Failed(failure) => return ChainStep::Exhausted(*failure),
            ChainState::Succeeded(attempt) => return ChainStep::Done(attempt.clone()),
            _ => {}
        }
        if self.attempts >= self.policy.max_retries {
            return ChainStep::Exhausted(self.exhaust());
        }

        while self.next_index < self.config.embed_strategies.len() {
            let index = self.next_index;
            self.next_index += 1;

            match self.build(index) {
                Some(attempt) => {
                    self.attempts += 1;
                    info!(
                        "Embedding {} via {} (attempt {}/{})",
                        self.config.platform, attempt.strategy, self.attempts, self.policy.max_retries
                    );
                    self.publish(EmbedEvent::Attempt {
                        platform: self.config.platform,
                        strategy: attempt.strategy,
                        index,
                    });
                    self.state = ChainState::Loading(attempt.clone());
                    return ChainStep::Load(attempt);
                }
                None => debug!(
                    "Skipping {} strategy {}: no embed URL for {}",
                    self.config.platform, self.config.embed_strategies[index].name, self.config.url
                ),
            }
        }

        ChainStep::Exhausted(self.exhaust())
    }

    /// The current embed finished loading without error
    pub fn report_success(&mut self) -> Option<&EmbedAttempt> {
        let ChainState::Loading(attempt) = std::mem::replace(&mut self.state, ChainState::Idle) else {
            return None;
        };
        info!("Embedded {} via {}", self.config.platform, attempt.strategy);
        self.publish(EmbedEvent::Succeeded {
            platform: self.config.platform,
            strategy: attempt.strategy,
        });
        self.state = ChainState::Succeeded(attempt);
        match &self.state {
            ChainState::Succeeded(attempt) => Some(attempt),
            _ => None,
        }
    }

    /// The current embed reported a load or HTTP error
    pub fn report_failure(&mut self, failure: EmbedFailure) -> FailureOutcome {
        let strategy = match &self.state {
            ChainState::Loading(attempt) => attempt.strategy,
            _ => "unknown",
        };
        warn!(
            "{} embed via {} failed: {}",
            self.config.platform, strategy, failure.message
        );
        self.publish(EmbedEvent::Failed {
            platform: self.config.platform,
            strategy,
            http_status: failure.http_status,
            message: failure.message,
        });

        if self.attempts >= self.policy.max_retries || !self.has_remaining() {
            return FailureOutcome::Exhausted(self.exhaust());
        }

        self.state = ChainState::Backoff;
        FailureOutcome::RetryAfter(self.policy.backoff)
    }

    /// User-triggered retry: start over from the first strategy with a fresh
    /// automatic budget
    pub fn manual_retry(&mut self) -> Result<(), ManualRetryError> {
        if !self.can_manual_retry() {
            return Err(ManualRetryError {
                max: self.policy.max_manual_retries,
            });
        }
        self.manual_retries += 1;
        self.next_index = 0;
        self.attempts = 0;
        self.state = ChainState::Idle;
        info!(
            "Manual retry {}/{} for {}",
            self.manual_retries, self.policy.max_manual_retries, self.config.url
        );
        Ok(())
    }

    /// Drive one round to completion, sleeping between failed attempts
    pub async fn run<L>(&mut self, loader: &L) -> EmbedOutcome
    where
        L: EmbedLoader + ?Sized,
    {
        loop {
            let attempt = match self.next_attempt() {
                ChainStep::Load(attempt) => attempt,
                ChainStep::Done(attempt) => return EmbedOutcome::Loaded(attempt),
                ChainStep::Exhausted(failure) => return EmbedOutcome::Failed(failure),
            };

            match loader.load(&attempt).await {
                Ok(()) => {
                    self.report_success();
                    return EmbedOutcome::Loaded(attempt);
                }
                Err(failure) => match self.report_failure(failure) {
                    FailureOutcome::RetryAfter(delay) => tokio::time::sleep(delay).await,
                    FailureOutcome::Exhausted(failure) => return EmbedOutcome::Failed(failure),
                },
            }
        }
    }
}

/// A chain running on the runtime. Dropping the task cancels it, including
/// any pending backoff timer.
pub struct EmbedTask {
    handle: Option<JoinHandle<(EmbedFallbackChain, EmbedOutcome)>>,
}

impl EmbedTask {
    pub fn spawn(mut chain: EmbedFallbackChain, loader: Arc<dyn EmbedLoader>) -> Self {
        let handle = tokio::spawn(async move {
            let outcome = chain.run(loader.as_ref()).await;
            (chain, outcome)
        });
        Self { handle: Some(handle) }
    }

    /// Wait for the round to finish. Returns `None` if it was cancelled.
    pub async fn join(mut self) -> Option<(EmbedFallbackChain, EmbedOutcome)> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for EmbedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
