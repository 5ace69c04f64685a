use serde::{Deserialize, Serialize};

/// 单次退避步长上限（毫秒）
pub const MAX_READ_RETRY_BACKOFF_MS: u64 = 60_000;

/// 调度器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 每个批次的工作项数
    pub batch_size: usize,
    /// 批次内并发lane数（K）
    pub concurrency: usize,
    /// 负载读取最大尝试次数（R）
    pub read_retry_attempts: u32,
    /// 线性退避步长：第n次重试前等待 n * backoff
    pub read_retry_backoff_ms: u64,
    /// 单个工作项大小上限
    pub max_item_size_bytes: u64,
    /// 超过此数量的提交需要外部确认
    pub large_submission_threshold: usize,
    /// 尚未执行的工作项上限，None表示不限制
    pub max_pending_items: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            concurrency: 3,
            read_retry_attempts: 3,
            read_retry_backoff_ms: 200,
            max_item_size_bytes: 50 * 1024 * 1024, // 50MB
            large_submission_threshold: 50,
            max_pending_items: None,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("批次大小必须大于0"));
        }

        if self.concurrency == 0 {
            return Err(anyhow::anyhow!("并发lane数必须大于0"));
        }

        if self.read_retry_attempts == 0 {
            return Err(anyhow::anyhow!("读取尝试次数必须大于0"));
        }

        if self.read_retry_backoff_ms > MAX_READ_RETRY_BACKOFF_MS {
            return Err(anyhow::anyhow!(
                "读取重试退避步长不能超过{}毫秒",
                MAX_READ_RETRY_BACKOFF_MS
            ));
        }

        if self.max_item_size_bytes == 0 {
            return Err(anyhow::anyhow!("工作项大小上限必须大于0"));
        }

        if let Some(limit) = self.max_pending_items {
            if limit == 0 {
                return Err(anyhow::anyhow!("待处理工作项上限必须大于0"));
            }
        }

        Ok(())
    }

    /// 提交数量是否需要经过确认闸门
    pub fn requires_confirmation(&self, item_count: usize) -> bool {
        item_count > self.large_submission_threshold
    }
}
