//! # Batch Core
//!
//! 批处理调度引擎的基础类型：数据模型、错误分类、外部协作者接口和配置。

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use errors::*;
pub use models::*;
pub use traits::{
    ItemOutcome, OutcomeRecorder, Payload, PayloadSource, ProcessingObserver, SubmissionGate,
    TransformEngine,
};

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
