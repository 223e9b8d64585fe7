//! Shared utilities: error taxonomy, response envelope, logging

pub mod error;
pub mod logger;

pub use error::{ApiError, ApiResult, Empty, Envelope, success, success_empty};
