//! # Batch Testing Utils
//!
//! Shared testing utilities for the batch scheduler workspace: mock
//! collaborators, data builders and helpers.
//!
//! ```toml
//! [dev-dependencies]
//! batch-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
