use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 调度器状态
///
/// 只有两个状态，没有终态，调度器可以无限复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Draining,
}

/// 累计处理统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_submitted: u64,
    /// 含失败项
    pub total_processed: u64,
    pub total_errors: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ProcessingStats {
    /// 最近一次运行的耗时；运行中或从未运行时为None
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => (end - start).to_std().ok(),
            _ => None,
        }
    }

    pub fn success_rate(&self) -> f64 {
        success_rate(self.total_processed, self.total_errors)
    }
}

/// `(processed - errors) / processed`，processed为0时返回0
pub fn success_rate(processed: u64, errors: u64) -> f64 {
    if processed == 0 {
        return 0.0;
    }
    processed.saturating_sub(errors) as f64 / processed as f64
}

/// 进度记录，每个工作项出结果后立即更新
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// 进程生命周期内累计
    pub current: u64,
    pub total: u64,
    /// 当前批次内
    pub batch_current: usize,
    pub batch_total: usize,
}

/// 错误日志条目，只追加不清理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub item_name: String,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// 一次完整排空后的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub processed: u64,
    pub errors: u64,
    pub duration: Duration,
    pub success_rate: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
