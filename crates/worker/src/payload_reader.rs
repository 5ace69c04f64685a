use std::time::Duration;

use batch_core::config::SchedulerConfig;
use batch_core::{ItemError, Payload, WorkItem};
use tokio::time::sleep;
use tracing::{debug, warn};

/// 负载读取重试策略
///
/// 线性退避：第n次失败后等待 `n * backoff_step` 再尝试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(200),
        }
    }
}

impl ReadRetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(
            config.read_retry_attempts,
            Duration::from_millis(config.read_retry_backoff_ms),
        )
    }

    /// 第 `attempt` 次（从1开始）失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }
}

/// 读取工作项负载，失败时按策略重试
///
/// 重试耗尽后返回 `ItemError::Read`，携带最后一次的底层错误。
pub async fn read_with_retry(item: &WorkItem, policy: &ReadRetryPolicy) -> Result<Payload, ItemError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match item.source().read().await {
            Ok(payload) => {
                if attempt > 1 {
                    debug!(item = item.name(), attempt, "负载读取在重试后成功");
                }
                return Ok(payload);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    item = item.name(),
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "读取负载失败，稍后重试: {e}"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(ItemError::Read {
                    item: item.name().to_string(),
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}
