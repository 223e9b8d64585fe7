//! Orders, order items, and their state machines
//!
//! Order lifecycle:
//!
//! ```text
//! PROCESSING ──payment succeeds──> ACTIVE ──all items COMPLETE──> COMPLETE
//!      │                             ^
//!      └──card declined: deleted     └── reopens if an item leaves COMPLETE
//! ```
//!
//! Item lifecycle: COOKING -> SENDING -> COMPLETE. The order's own status is
//! recomputed from its items on every item update, so COMPLETE is never a
//! terminal latch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Active,
    Complete,
}

impl OrderStatus {
    /// Human-readable form used in API payloads
    pub fn display(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Payment processing",
            OrderStatus::Active => "Active",
            OrderStatus::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    Cooking,
    Sending,
    Complete,
}

impl OrderItemStatus {
    pub fn display(&self) -> &'static str {
        match self {
            OrderItemStatus::Cooking => "Cooking",
            OrderItemStatus::Sending => "Sending",
            OrderItemStatus::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub restaurant_id: u64,
    /// None once the customer account is deleted; the order survives
    pub customer_id: Option<u64>,
    pub table: i32,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    /// Accumulates across tip charges
    pub tip: Option<Decimal>,
    pub total: Decimal,
    /// Provider processing fee, recorded best-effort after capture
    pub fee: Option<Decimal>,
    pub payment_intent_id: Option<String>,
    /// Intent for the most recent tip charge, kept for retries
    pub tip_payment_intent_id: Option<String>,
}

/// Frozen copy of a customization as ordered; survives later menu edits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCustomization {
    pub name: String,
    pub options: Vec<String>,
    pub price_additions: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub status: OrderItemStatus,
    /// Meal name frozen at order time
    pub meal_name: String,
    /// Unit price frozen at order time
    pub meal_price: Decimal,
    pub quantity: u32,
    /// Line total: (unit price + additions) * quantity
    pub total: Decimal,
    pub customizations: Vec<OrderItemCustomization>,
}

/// Priced line ready to be inserted alongside a new order
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub meal_name: String,
    pub meal_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub customizations: Vec<OrderItemCustomization>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_displays_match_api_contract() {
        assert_eq!(OrderStatus::Processing.display(), "Payment processing");
        assert_eq!(OrderStatus::Active.display(), "Active");
        assert_eq!(OrderStatus::Complete.display(), "Complete");
        assert_eq!(OrderItemStatus::Cooking.display(), "Cooking");
        assert_eq!(OrderItemStatus::Sending.display(), "Sending");
        assert_eq!(OrderItemStatus::Complete.display(), "Complete");
    }

    #[test]
    fn wire_form_is_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(OrderItemStatus::Cooking).unwrap(),
            serde_json::json!("COOKING")
        );
        assert_eq!(
            serde_json::from_value::<OrderStatus>(serde_json::json!("ACTIVE")).unwrap(),
            OrderStatus::Active
        );
    }
}
