use chrono::Duration;
use plutus_core::FeePolicy;
use plutus_worker::RetryPolicy;

/// Deployment knobs for the execution pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Number of concurrent trade workers
    pub workers: usize,
    /// Bound of the in-process work queue
    pub queue_capacity: usize,
    /// Fee schedule applied to fills
    pub fees: FeePolicy,
    /// Retry schedule for transient price/store failures
    pub retry: RetryPolicy,
    /// Quotes older than this are refused as stale
    pub price_max_age: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            fees: FeePolicy::default(),
            retry: RetryPolicy::default(),
            price_max_age: Duration::seconds(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_sane() {
        let config = RunnerConfig::default();
        assert!(config.workers > 0);
        assert!(config.queue_capacity >= config.workers);
        assert_eq!(config.fees.rate, dec!(0.001));
    }
}
