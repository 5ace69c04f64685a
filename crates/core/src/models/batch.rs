use std::sync::Arc;

use uuid::Uuid;

use super::work_item::{InputFile, OperationKind, OperationOptions, WorkItem};

/// 批次：一次提交中固定大小的切片，是FIFO排序的基本单位
///
/// `batch_index` 和 `total_batches` 相对于所属提交，而非全局队列。
#[derive(Debug, Clone)]
pub struct Batch {
    pub submission_id: Uuid,
    pub operation: OperationKind,
    pub batch_index: usize,
    pub total_batches: usize,
    pub items: Vec<WorkItem>,
}

impl Batch {
    /// 将一次提交切分为若干批次
    ///
    /// 空输入返回空列表。`batch_size` 为0时按1处理。
    pub fn split(
        inputs: Vec<InputFile>,
        operation: OperationKind,
        options: OperationOptions,
        batch_size: usize,
    ) -> Vec<Batch> {
        if inputs.is_empty() {
            return Vec::new();
        }

        let batch_size = batch_size.max(1);
        let submission_id = Uuid::new_v4();
        let options = Arc::new(options);
        let total_batches = inputs.len().div_ceil(batch_size);

        let mut batches = Vec::with_capacity(total_batches);
        let mut iter = inputs.into_iter().peekable();
        let mut batch_index = 0;
        while iter.peek().is_some() {
            let items = iter
                .by_ref()
                .take(batch_size)
                .map(|input| WorkItem::new(input, operation, Arc::clone(&options)))
                .collect();
            batches.push(Batch {
                submission_id,
                operation,
                batch_index,
                total_batches,
                items,
            });
            batch_index += 1;
        }

        batches
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
