//! Restaurants and their tax categories

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
    pub address: String,
    /// IANA timezone name, used when formatting order times for staff
    pub timezone: String,
    /// Connected payment-provider account that receives this restaurant's
    /// charges
    pub gateway_account_id: String,
}

/// Named tax rate owned by a restaurant
///
/// Every restaurant always has a category named `Default`; meals whose
/// category is deleted fall back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCategory {
    pub id: u64,
    pub restaurant_id: u64,
    pub name: String,
    /// Percentage rate, e.g. `6.000` for 6%
    pub rate: Decimal,
}

pub const DEFAULT_TAX_CATEGORY: &str = "Default";
