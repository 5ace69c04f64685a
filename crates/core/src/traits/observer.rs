use async_trait::async_trait;

use crate::errors::ItemError;
use crate::models::{OperationKind, ProgressRecord, RunSummary, WorkItem};

/// 处理进度观察者（通常由UI实现）
///
/// 回调在调度循环内同步触发，实现者不能阻塞。
pub trait ProcessingObserver: Send + Sync {
    /// 每个工作项出结果后触发
    fn on_progress(&self, _progress: &ProgressRecord) {}

    /// 队列完全排空后触发一次
    fn on_complete(&self, _summary: &RunSummary) {}

    /// 每个失败的工作项触发一次
    fn on_error(&self, _item: &WorkItem, _error: &ItemError) {}
}

/// 大批量提交的确认闸门
///
/// 由调用方在 `add_items` 之前询问，调度核心本身从不调用。
#[async_trait]
pub trait SubmissionGate: Send + Sync {
    async fn confirm(&self, item_count: usize, kind: OperationKind) -> bool;
}
