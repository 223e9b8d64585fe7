//! Token authentication and role extractors

pub mod extractor;

pub use extractor::{ActiveCustomer, ActiveStaff, CurrentUser};

/// Pull the opaque token out of an `Authorization: Token <value>` header
pub fn extract_from_header(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
