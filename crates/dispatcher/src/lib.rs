//! # Batch Dispatcher
//!
//! 全局批次队列、排空循环、统计聚合和通知回调。

pub mod notifier;
pub mod queue;
pub mod scheduler;
pub mod stats;

pub use notifier::Notifier;
pub use queue::BatchQueue;
pub use scheduler::BatchScheduler;
pub use stats::StatsAggregator;
