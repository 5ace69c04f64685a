//! 批次调度器
//!
//! 全局只有一个排空循环。提交时如果调度器空闲则启动循环，
//! 否则批次只是排队等待。循环逐个取出队首批次并执行完毕后再取下一个，
//! 批次之间从不交错；队列空时发出汇总并回到空闲状态。

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use batch_core::config::SchedulerConfig;
use batch_core::{
    Batch, ErrorRecord, InputFile, ItemOutcome, OperationKind, OperationOptions, OutcomeRecorder,
    ProcessingStats, ProgressRecord, RunSummary, SchedulerError, SchedulerResult, SchedulerState,
    WorkItem,
};
use batch_worker::{LanePool, OperationDispatcher};
use chrono::Utc;
use futures::FutureExt;
use metrics::gauge;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::notifier::{CompleteCallback, ErrorCallback, Notifier, ProgressCallback};
use crate::queue::BatchQueue;
use crate::stats::StatsAggregator;

/// 队列和状态放在同一把锁下，入队与启动循环的判断是原子的
struct QueueState {
    queue: BatchQueue,
    state: SchedulerState,
}

struct SchedulerInner {
    config: SchedulerConfig,
    dispatcher: Arc<OperationDispatcher>,
    lane_pool: LanePool,
    queue: AsyncMutex<QueueState>,
    stats: StatsAggregator,
    notifier: Notifier,
    state_tx: watch::Sender<SchedulerState>,
    last_summary: Mutex<Option<RunSummary>>,
}

/// 每个工作项出结果后更新统计并触发通知
struct RunRecorder<'a> {
    stats: &'a StatsAggregator,
    notifier: &'a Notifier,
}

impl OutcomeRecorder for RunRecorder<'_> {
    fn record(&self, _index: usize, item: &WorkItem, outcome: &ItemOutcome) {
        let progress = self.stats.record_outcome(item, outcome);
        if let Err(e) = outcome {
            self.notifier.error(item, e);
        }
        self.notifier.progress(&progress);
    }
}

/// 批处理调度器
///
/// 克隆开销很小，所有克隆共享同一个队列和统计。
#[derive(Clone)]
pub struct BatchScheduler {
    inner: Arc<SchedulerInner>,
}

impl BatchScheduler {
    pub fn new(config: SchedulerConfig, dispatcher: Arc<OperationDispatcher>) -> SchedulerResult<Self> {
        config
            .validate()
            .map_err(|e| SchedulerError::Configuration(e.to_string()))?;

        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        let lane_pool = LanePool::new(config.concurrency);

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                config,
                dispatcher,
                lane_pool,
                queue: AsyncMutex::new(QueueState {
                    queue: BatchQueue::new(),
                    state: SchedulerState::Idle,
                }),
                stats: StatsAggregator::new(),
                notifier: Notifier::new(),
                state_tx,
                last_summary: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// 提交工作项
    ///
    /// 切分为固定大小的批次追加到队尾，返回第一个批次前面排队的批次数。
    /// 空提交不做任何事。需要在Tokio运行时中调用。
    pub async fn add_items(
        &self,
        items: Vec<InputFile>,
        operation: OperationKind,
        options: OperationOptions,
    ) -> SchedulerResult<usize> {
        if items.is_empty() {
            let guard = self.inner.queue.lock().await;
            return Ok(guard.queue.len());
        }

        let item_count = items.len();
        let mut guard = self.inner.queue.lock().await;

        if let Some(limit) = self.inner.config.max_pending_items {
            let pending = guard.queue.pending_items();
            if pending + item_count > limit {
                return Err(SchedulerError::QueueFull {
                    pending,
                    requested: item_count,
                    limit,
                });
            }
        }

        let batches = Batch::split(items, operation, options, self.inner.config.batch_size);
        let batch_count = batches.len();
        let position = guard.queue.push_submission(batches);
        self.inner.stats.add_submitted(item_count);
        gauge!("batch_queue_depth").set(guard.queue.len() as f64);

        info!(
            operation = %operation,
            items = item_count,
            batches = batch_count,
            position,
            "提交已入队"
        );

        if guard.state == SchedulerState::Idle {
            guard.state = SchedulerState::Draining;
            self.inner.state_tx.send_replace(SchedulerState::Draining);
            tokio::spawn(Self::drain(Arc::clone(&self.inner)));
        } else {
            debug!("排空循环正在运行，批次等待执行");
        }

        Ok(position)
    }

    async fn drain(inner: Arc<SchedulerInner>) {
        let run_id = Uuid::new_v4();
        let span = info_span!("drain", %run_id);

        async move {
            inner.stats.begin_run(Utc::now());
            info!("开始排空批次队列");

            loop {
                let next = {
                    let mut guard = inner.queue.lock().await;
                    match guard.queue.pop_front() {
                        Some(batch) => {
                            gauge!("batch_queue_depth").set(guard.queue.len() as f64);
                            Some(batch)
                        }
                        None => {
                            let summary = inner.stats.finish_run(run_id, Utc::now());
                            info!(
                                processed = summary.processed,
                                errors = summary.errors,
                                duration_ms = summary.duration.as_millis() as u64,
                                success_rate = summary.success_rate,
                                "批次队列已排空"
                            );
                            *inner
                                .last_summary
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
                            inner.notifier.complete(&summary);

                            guard.state = SchedulerState::Idle;
                            inner.state_tx.send_replace(SchedulerState::Idle);
                            None
                        }
                    }
                };

                let Some(batch) = next else {
                    break;
                };

                inner.stats.begin_batch(batch.len());
                let recorder = RunRecorder {
                    stats: &inner.stats,
                    notifier: &inner.notifier,
                };
                let finished = AssertUnwindSafe(inner.lane_pool.run_batch(
                    &batch,
                    &inner.dispatcher,
                    &recorder,
                ))
                .catch_unwind()
                .await;
                if finished.is_err() {
                    // 记账出错时丢弃该批次剩余结果，继续排空，保证最终回到Idle
                    error!(
                        batch_index = batch.batch_index,
                        total_batches = batch.total_batches,
                        "批次执行时发生panic，跳过该批次"
                    );
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 等待队列完全排空
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state_tx.subscribe();
        // 发送端由调度器持有，不会关闭
        let _ = rx.wait_for(|state| *state == SchedulerState::Idle).await;
    }

    pub async fn state(&self) -> SchedulerState {
        self.inner.queue.lock().await.state
    }

    pub async fn pending_batches(&self) -> usize {
        self.inner.queue.lock().await.queue.len()
    }

    pub fn stats(&self) -> ProcessingStats {
        self.inner.stats.snapshot()
    }

    pub fn progress(&self) -> ProgressRecord {
        self.inner.stats.progress()
    }

    pub fn error_log(&self) -> Vec<ErrorRecord> {
        self.inner.stats.error_log()
    }

    pub fn last_summary(&self) -> Option<RunSummary> {
        self.inner
            .last_summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn requires_confirmation(&self, item_count: usize) -> bool {
        self.inner.config.requires_confirmation(item_count)
    }

    pub fn on_progress(&self, callback: impl Fn(&ProgressRecord) + Send + Sync + 'static) {
        let callback: ProgressCallback = Arc::new(callback);
        self.inner.notifier.set_on_progress(callback);
    }

    pub fn on_complete(&self, callback: impl Fn(&RunSummary) + Send + Sync + 'static) {
        let callback: CompleteCallback = Arc::new(callback);
        self.inner.notifier.set_on_complete(callback);
    }

    pub fn on_error(
        &self,
        callback: impl Fn(&WorkItem, &batch_core::ItemError) + Send + Sync + 'static,
    ) {
        let callback: ErrorCallback = Arc::new(callback);
        self.inner.notifier.set_on_error(callback);
    }

    pub fn set_observer(&self, observer: Arc<dyn batch_core::ProcessingObserver>) {
        self.inner.notifier.set_observer(observer);
    }
}
