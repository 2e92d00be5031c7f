//! Runtime tuning for [`GraphRunner`](super::GraphRunner).

use std::time::Duration;

use crate::source::SourceFilter;

/// How transient stage failures are retried before being promoted to
/// `Fatal`.
///
/// Delays grow exponentially from `base_delay` and are jittered so
/// concurrent branches retrying against the same upstream service do not
/// synchronize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt. `3` means up to four
    /// invocations in total.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Retry without sleeping. Intended for tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    /// Backoff before retry number `retry` (1-based), jittered to between
    /// 50% and 100% of the exponential step.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let step = self
            .base_delay
            .saturating_mul(1u32 << retry.saturating_sub(1).min(16));
        step.mul_f64(rand::random_range(0.5..=1.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

/// Per-run configuration: how many items to fetch, which ones, and the
/// retry policy applied at every stage invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on items fetched per run.
    pub batch_limit: usize,
    /// Filter passed to the source when fetching the batch.
    pub filter: SourceFilter,
    pub retry: RetryPolicy,
}

impl RunnerConfig {
    /// Read overrides from the environment, falling back to defaults.
    ///
    /// Honors `RELAYGRAPH_BATCH_LIMIT`, `RELAYGRAPH_MAX_RETRIES`, and
    /// `RELAYGRAPH_RETRY_BASE_MS`. A `.env` file is loaded first when
    /// present; unparseable values fall back silently.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(limit) = env_parse("RELAYGRAPH_BATCH_LIMIT") {
            config.batch_limit = limit;
        }
        if let Some(max) = env_parse("RELAYGRAPH_MAX_RETRIES") {
            config.retry.max_retries = max;
        }
        if let Some(ms) = env_parse("RELAYGRAPH_RETRY_BASE_MS") {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        config
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_limit: 5,
            filter: SourceFilter::unread(),
            retry: RetryPolicy::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunnerConfig::default();
        assert_eq!(config.batch_limit, 5);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.filter.unread_only);
    }

    #[test]
    fn immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn delay_grows_with_retry_number() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let first = policy.delay_for(1);
        let third = policy.delay_for(3);
        assert!(first >= Duration::from_millis(50));
        assert!(first <= Duration::from_millis(100));
        assert!(third >= Duration::from_millis(200));
        assert!(third <= Duration::from_millis(400));
    }
}
