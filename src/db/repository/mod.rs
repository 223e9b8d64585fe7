//! Repository module
//!
//! Typed CRUD and domain queries over the entity store.

pub mod account;
pub mod catalog;
pub mod order;
pub mod request;

pub use account::AccountRepository;
pub use catalog::CatalogRepository;
pub use order::OrderRepository;
pub use request::RequestRepository;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The `Default` tax category cannot be removed
    #[error("Default tax category is protected")]
    DefaultTaxCategory,
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
