//! Test helper utilities and common testing patterns

use batch_core::config::SchedulerConfig;
use std::time::Duration;
use tokio::time::sleep;

/// Scheduler configuration with no retry backoff so tests stay fast
pub fn test_scheduler_config(batch_size: usize, concurrency: usize) -> SchedulerConfig {
    SchedulerConfig {
        batch_size,
        concurrency,
        read_retry_attempts: 3,
        read_retry_backoff_ms: 1,
        ..SchedulerConfig::default()
    }
}

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }

        false
    }
}
