use std::sync::{Mutex, MutexGuard, PoisonError};

use batch_core::{
    success_rate, ErrorRecord, ItemOutcome, ProcessingStats, ProgressRecord, RunSummary, WorkItem,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Default)]
struct StatsState {
    stats: ProcessingStats,
    progress: ProgressRecord,
    error_log: Vec<ErrorRecord>,
    run_processed: u64,
    run_errors: u64,
}

/// 统计与进度聚合
///
/// 累计计数贯穿进程生命周期；`run_*` 计数只服务于当前一次排空的汇总。
/// 错误日志只追加，长度始终等于 `total_errors`。
#[derive(Debug, Default)]
pub struct StatsAggregator {
    state: Mutex<StatsState>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_submitted(&self, count: usize) {
        let mut state = self.lock();
        state.stats.total_submitted += count as u64;
        state.progress.total += count as u64;
    }

    pub fn begin_run(&self, started_at: DateTime<Utc>) {
        let mut state = self.lock();
        state.stats.start_time = Some(started_at);
        state.stats.end_time = None;
        state.run_processed = 0;
        state.run_errors = 0;
    }

    pub fn begin_batch(&self, batch_total: usize) {
        let mut state = self.lock();
        state.progress.batch_current = 0;
        state.progress.batch_total = batch_total;
    }

    /// 记录一个工作项的结果，返回更新后的进度快照
    pub fn record_outcome(&self, item: &WorkItem, outcome: &ItemOutcome) -> ProgressRecord {
        let mut state = self.lock();
        state.stats.total_processed += 1;
        state.run_processed += 1;
        state.progress.current += 1;
        state.progress.batch_current += 1;

        if let Err(e) = outcome {
            state.stats.total_errors += 1;
            state.run_errors += 1;
            state.error_log.push(ErrorRecord {
                item_name: item.name().to_string(),
                kind: e.kind().to_string(),
                message: e.to_string(),
                timestamp: Utc::now(),
            });
        }

        state.progress
    }

    pub fn finish_run(&self, run_id: Uuid, finished_at: DateTime<Utc>) -> RunSummary {
        let mut state = self.lock();
        state.stats.end_time = Some(finished_at);

        let started_at = state.stats.start_time.unwrap_or(finished_at);
        RunSummary {
            run_id,
            processed: state.run_processed,
            errors: state.run_errors,
            duration: (finished_at - started_at).to_std().unwrap_or_default(),
            success_rate: success_rate(state.run_processed, state.run_errors),
            started_at,
            finished_at,
        }
    }

    pub fn snapshot(&self) -> ProcessingStats {
        self.lock().stats.clone()
    }

    pub fn progress(&self) -> ProgressRecord {
        self.lock().progress
    }

    pub fn error_log(&self) -> Vec<ErrorRecord> {
        self.lock().error_log.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_core::{ItemError, OperationKind};
    use batch_testing_utils::InputFileBuilder;
    use bytes::Bytes;

    #[test]
    fn test_counts_and_error_log_stay_consistent() {
        let stats = StatsAggregator::new();
        let item = InputFileBuilder::new("a.pdf").build_item(OperationKind::Merge);

        stats.add_submitted(3);
        stats.begin_run(Utc::now());
        stats.begin_batch(3);
        stats.record_outcome(&item, &Ok(Bytes::new()));
        stats.record_outcome(&item, &Err(ItemError::transform("a.pdf", "boom")));
        let progress = stats.record_outcome(&item, &Ok(Bytes::new()));

        assert_eq!(progress.current, 3);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.batch_current, 3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_processed, 3);
        assert_eq!(snapshot.total_errors, 1);
        assert_eq!(stats.error_log().len(), 1);
        assert_eq!(stats.error_log()[0].kind, "transform");
    }

    #[test]
    fn test_run_summary_only_covers_current_run() {
        let stats = StatsAggregator::new();
        let item = InputFileBuilder::new("a.pdf").build_item(OperationKind::Merge);

        stats.begin_run(Utc::now());
        stats.record_outcome(&item, &Err(ItemError::transform("a.pdf", "boom")));
        let first = stats.finish_run(Uuid::new_v4(), Utc::now());
        assert_eq!(first.processed, 1);
        assert_eq!(first.success_rate, 0.0);

        stats.begin_run(Utc::now());
        stats.record_outcome(&item, &Ok(Bytes::new()));
        stats.record_outcome(&item, &Ok(Bytes::new()));
        let second = stats.finish_run(Uuid::new_v4(), Utc::now());
        assert_eq!(second.processed, 2);
        assert_eq!(second.errors, 0);
        assert_eq!(second.success_rate, 1.0);
        assert_eq!(stats.snapshot().total_processed, 3);
    }

    #[test]
    fn test_empty_run_success_rate_is_zero() {
        let stats = StatsAggregator::new();
        stats.begin_run(Utc::now());
        let summary = stats.finish_run(Uuid::new_v4(), Utc::now());
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.success_rate, 0.0);
    }
}
