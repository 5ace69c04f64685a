//! 配置管理
//!
//! 配置按以下顺序叠加：内置默认值、TOML配置文件、`BATCH_` 前缀的环境变量。
//!
//! ```rust,no_run
//! use batch_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/batch.toml"))?;
//! println!("batch_size = {}", config.scheduler.batch_size);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod models;

#[cfg(test)]
mod tests;

pub use models::*;
