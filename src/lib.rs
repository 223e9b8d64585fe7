//! Swick Server Library
//!
//! Restaurant table-ordering service: menu and pricing reference data, order
//! placement with card payments, the order/item lifecycle, and channel fan-out
//! to customer / restaurant / staff apps.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod pricing;
pub mod utils;

// Re-export commonly used types
pub use self::core::{Config, Server, ServerState};
pub use utils::{ApiError, ApiResult};

/// Set up the process environment: dotenv + logging
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger(None, log_dir.as_deref());
}
