//! User accounts and their role profiles
//!
//! A [`User`] is the shared identity record. A user acts as a [`Customer`],
//! a [`Staff`] member, or both; each role profile carries only the data that
//! role needs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    /// Unset until the user completes their profile
    pub name: Option<String>,
}

/// Customer profile, linked one-to-one with its payment-provider customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub user_id: u64,
    /// Provider-side customer id; cards and intents attach to it
    pub gateway_customer_id: String,
}

/// Staff profile; unattached until an invite binds it to a restaurant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: u64,
    pub user_id: u64,
    pub restaurant_id: Option<u64>,
}

/// Pending invitation for a staff email to join a restaurant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInvite {
    pub id: u64,
    pub email: String,
    pub restaurant_id: u64,
    pub accepted: bool,
}
