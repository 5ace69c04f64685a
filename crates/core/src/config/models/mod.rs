pub mod app_config;
pub mod operations;
pub mod scheduler;

pub use app_config::AppConfig;
pub use operations::{OperationRule, OperationRulesConfig};
pub use scheduler::{SchedulerConfig, MAX_READ_RETRY_BACKOFF_MS};
