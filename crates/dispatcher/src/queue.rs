use std::collections::VecDeque;

use batch_core::Batch;

/// 全局批次队列，严格FIFO
#[derive(Debug, Default)]
pub struct BatchQueue {
    batches: VecDeque<Batch>,
    pending_items: usize,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把一次提交的所有批次追加到队尾，返回第一个批次前面排队的批次数
    pub fn push_submission(&mut self, batches: Vec<Batch>) -> usize {
        let position = self.batches.len();
        for batch in batches {
            self.pending_items += batch.len();
            self.batches.push_back(batch);
        }
        position
    }

    pub fn pop_front(&mut self) -> Option<Batch> {
        let batch = self.batches.pop_front()?;
        self.pending_items -= batch.len();
        Some(batch)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// 队列中尚未开始执行的工作项数
    pub fn pending_items(&self) -> usize {
        self.pending_items
    }
}
