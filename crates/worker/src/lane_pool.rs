//! 批次内的并发限制
//!
//! 一个批次启动 `min(K, N)` 条lane，lane `i` 依次处理下标 `i, i+K, i+2K, ...`。
//! 所有lane在同一个任务内协作式并发，批次在所有lane耗尽各自条带后才算完成。

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use batch_core::{Batch, ItemError, ItemOutcome, OutcomeRecorder};
use futures::future::join_all;
use futures::FutureExt;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::operation_dispatcher::OperationDispatcher;

/// 单个批次的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_index: usize,
    pub total_batches: usize,
    pub lanes: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LanePool {
    concurrency: usize,
}

impl LanePool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn lane_count(&self, batch_len: usize) -> usize {
        self.concurrency.min(batch_len)
    }

    /// lane `lane` 负责的下标条带，升序
    pub fn stripe(&self, lane: usize, batch_len: usize) -> impl Iterator<Item = usize> {
        (lane..batch_len).step_by(self.concurrency)
    }

    /// 执行一个批次直到所有工作项都有结果
    ///
    /// 单个工作项的错误（包括处理器panic）在lane边界被捕获并交给 `recorder`，
    /// lane继续处理条带中的下一项。
    pub async fn run_batch(
        &self,
        batch: &Batch,
        dispatcher: &OperationDispatcher,
        recorder: &dyn OutcomeRecorder,
    ) -> BatchReport {
        let started = Instant::now();
        let batch_len = batch.len();
        let lanes = self.lane_count(batch_len);
        let succeeded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        debug!(
            batch_index = batch.batch_index,
            total_batches = batch.total_batches,
            items = batch_len,
            lanes,
            "开始执行批次"
        );

        let lane_futures = (0..lanes).map(|lane| {
            let succeeded = &succeeded;
            let failed = &failed;
            async move {
                for index in self.stripe(lane, batch_len) {
                    let item = &batch.items[index];
                    let item_started = Instant::now();

                    let outcome: ItemOutcome = AssertUnwindSafe(dispatcher.dispatch(item))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            Err(ItemError::transform(item.name(), "处理器执行时发生panic"))
                        });

                    histogram!("batch_item_duration_ms")
                        .record(item_started.elapsed().as_secs_f64() * 1000.0);
                    counter!("batch_items_processed_total").increment(1);

                    match &outcome {
                        Ok(_) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            counter!("batch_items_failed_total", "kind" => e.kind()).increment(1);
                            warn!(lane, index, item = item.name(), error_kind = e.kind(), "工作项处理失败: {e}");
                        }
                    }

                    recorder.record(index, item, &outcome);
                }
            }
        });

        join_all(lane_futures).await;

        let report = BatchReport {
            batch_index: batch.batch_index,
            total_batches: batch.total_batches,
            lanes,
            succeeded: succeeded.into_inner(),
            failed: failed.into_inner(),
            elapsed: started.elapsed(),
        };

        counter!("batch_batches_completed_total").increment(1);
        info!(
            batch_index = report.batch_index,
            total_batches = report.total_batches,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "批次执行完成"
        );

        report
    }
}
