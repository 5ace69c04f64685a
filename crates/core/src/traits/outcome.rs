use crate::errors::ItemError;
use crate::models::WorkItem;

use super::payload::Payload;

/// 单个工作项的处理结果
pub type ItemOutcome = Result<Payload, ItemError>;

/// 结果记录器
///
/// lane在每个工作项出结果后立即调用，`index` 是该项在批次内的下标。
/// 同一批次的调用可能来自不同lane，实现者需要自行同步。
pub trait OutcomeRecorder: Send + Sync {
    fn record(&self, index: usize, item: &WorkItem, outcome: &ItemOutcome);
}
