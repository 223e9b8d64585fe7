//! Table service requests ("water", "check", ...)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request type a restaurant offers to seated customers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOption {
    pub id: u64,
    pub restaurant_id: u64,
    pub name: String,
}

/// Open request made by a customer at a table
///
/// At most one open request per (customer, option) pair; staff delete the
/// record when the request is handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: u64,
    pub customer_id: u64,
    pub request_option_id: u64,
    pub table: i32,
    pub requested_at: DateTime<Utc>,
}
