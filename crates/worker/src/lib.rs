//! # Batch Worker
//!
//! 工作项的实际执行：操作处理器、分发器、负载读取重试以及批次内的lane并发。

pub mod handlers;
pub mod lane_pool;
pub mod operation_dispatcher;
pub mod payload_reader;

pub use handlers::{
    CompressHandler, ConvertHandler, InputValidator, MergeHandler, OcrHandler, OperationHandler,
};
pub use lane_pool::{BatchReport, LanePool};
pub use operation_dispatcher::OperationDispatcher;
pub use payload_reader::{read_with_retry, ReadRetryPolicy};
