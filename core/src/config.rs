use std::time::Duration;

/// Tunables shared by the resolvers, the embed chain and the voice pipeline
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Automatic embed load attempts before the chain gives up
    pub embed_max_retries: usize,
    /// User-triggered restarts of the embed chain
    pub manual_max_retries: usize,
    /// Delay between automatic embed attempts
    pub embed_backoff: Duration,
    /// How often the listener supervisor checks the recognizer is alive
    pub keepalive_interval: Duration,
    /// Ceiling for the recognizer restart backoff
    pub restart_backoff_max: Duration,
    /// Number of diagnostics records kept in memory
    pub diagnostics_capacity: usize,
    /// Timeout for metadata and playlist requests
    pub http_timeout: Duration,
    /// User agent sent with metadata and playlist requests
    pub user_agent: String,
    /// Download HLS master playlists during `resolve` to list variants
    pub probe_hls_variants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embed_max_retries: 4,
            manual_max_retries: 3,
            embed_backoff: Duration::from_millis(1000),
            keepalive_interval: Duration::from_secs(5),
            restart_backoff_max: Duration::from_secs(30),
            diagnostics_capacity: 100,
            http_timeout: Duration::from_secs(10),
            user_agent: format!("playgate/{}", env!("CARGO_PKG_VERSION")),
            probe_hls_variants: false,
        }
    }
}

impl EngineConfig {
    /// Build config from `PLAYGATE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Missing or unparseable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            embed_max_retries: number("PLAYGATE_EMBED_MAX_RETRIES")
                .map(|v| v as usize)
                .unwrap_or(defaults.embed_max_retries),
            manual_max_retries: number("PLAYGATE_MANUAL_MAX_RETRIES")
                .map(|v| v as usize)
                .unwrap_or(defaults.manual_max_retries),
            embed_backoff: number("PLAYGATE_EMBED_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.embed_backoff),
            keepalive_interval: number("PLAYGATE_KEEPALIVE_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.keepalive_interval),
            restart_backoff_max: number("PLAYGATE_RESTART_BACKOFF_MAX_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.restart_backoff_max),
            diagnostics_capacity: number("PLAYGATE_DIAGNOSTICS_CAPACITY")
                .filter(|v| *v > 0)
                .map(|v| v as usize)
                .unwrap_or(defaults.diagnostics_capacity),
            http_timeout: number("PLAYGATE_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            user_agent: lookup("PLAYGATE_USER_AGENT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            probe_hls_variants: lookup("PLAYGATE_PROBE_HLS_VARIANTS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.probe_hls_variants),
        }
    }

    /// HTTP client configured with the timeout and user agent
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            })
    }
}
