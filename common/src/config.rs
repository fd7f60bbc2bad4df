use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_PROBE_CONCURRENCY: usize = 16;

/// Settings for a single analyzer instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// How long a built snapshot is served before the next call rebuilds it.
    pub cache_ttl: Duration,
    /// Upper bound for a single reachability probe.
    pub probe_timeout: Duration,
    /// Number of probes allowed in flight at once.
    pub probe_concurrency: usize,
    /// Disables live probing. Edges are still produced, with `unknown` status.
    pub probing_enabled: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            probing_enabled: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Zero is clamped to one so the pool can always make progress.
    pub fn with_probe_concurrency(mut self, limit: usize) -> Self {
        self.probe_concurrency = limit.max(1);
        self
    }

    pub fn with_probing(mut self, enabled: bool) -> Self {
        self.probing_enabled = enabled;
        self
    }

    pub fn effective_concurrency(&self) -> usize {
        self.probe_concurrency.max(1)
    }
}
