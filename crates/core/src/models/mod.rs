//! # 数据模型
//!
//! 批处理流水线中传递的数据结构。
//!
//! - [`InputFile`]: 调用方提交的类文件输入
//! - [`WorkItem`]: 带操作类型和参数的工作单元
//! - [`Batch`]: 一次提交中固定大小的切片
//! - [`ProcessingStats`] / [`ProgressRecord`] / [`ErrorRecord`] / [`RunSummary`]: 统计与通知

pub mod batch;
pub mod stats;
pub mod work_item;

pub use batch::Batch;
pub use stats::{
    success_rate, ErrorRecord, ProcessingStats, ProgressRecord, RunSummary, SchedulerState,
};
pub use work_item::{InputFile, ItemMetadata, OperationKind, OperationOptions, WorkItem};
