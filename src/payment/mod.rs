//! Payment gateway abstraction
//!
//! [`PaymentGateway`] is the seam between the order workflow and the
//! provider. Production uses the Stripe REST implementation; tests inject a
//! mock. Charge outcomes are modelled as enums rather than errors because a
//! declined card is a normal business branch, not a fault.

pub mod stripe;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use stripe::StripeGateway;

/// Provider minimum for a USD charge, in cents
pub const MINIMUM_CHARGE_CENTS: i64 = 50;

/// Reject amounts the provider would refuse before creating any records
pub fn ensure_chargeable(amount_cents: i64) -> Result<(), GatewayError> {
    if amount_cents < MINIMUM_CHARGE_CENTS {
        return Err(GatewayError::AmountBelowMinimum(amount_cents));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("amount {0} cents is below the chargeable minimum")]
    AmountBelowMinimum(i64),

    /// Transport failure or a malformed provider response
    #[error("payment provider error: {0}")]
    Api(String),
}

/// Immediate charge attempt against a saved card
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Connected account receiving the funds
    pub gateway_account_id: String,
    /// Platform customer who owns the card. When set, the payment method is
    /// cloned onto the connected account before charging; when `None` the
    /// method already lives there (tip charges reuse the order's method).
    pub customer_gateway_id: Option<String>,
    pub receipt_email: String,
    pub payment_method_id: String,
    pub amount_cents: i64,
    /// Recorded in intent metadata for ownership checks on retry
    pub order_id: u64,
}

/// Result of a confirmed charge attempt
#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    Succeeded {
        intent_id: String,
    },
    /// 3-D Secure challenge pending; the client finishes it with the secret
    RequiresAction {
        intent_id: String,
        client_secret: String,
    },
    /// Card declined at confirmation time
    RequiresPaymentMethod {
        intent_id: String,
        error: Option<String>,
    },
    /// Card rejected before an intent could be confirmed
    CardError {
        error: String,
    },
    /// Intent status this service does not know how to progress
    Unhandled,
}

/// Result of re-checking an intent after client-side authentication
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Succeeded {
        amount_cents: i64,
    },
    RequiresPaymentMethod {
        error: Option<String>,
    },
    CardError {
        error: String,
    },
    /// Intent exists but was not created for this order
    NotOwned,
    Unhandled,
}

/// Saved card summary for the wallet screen
#[derive(Debug, Clone, serde::Serialize)]
pub struct CardSummary {
    pub payment_method_id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
}

/// Card reference behind a captured intent
#[derive(Debug, Clone)]
pub struct IntentCard {
    /// `None` when the method was since detached
    pub payment_method_id: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a provider-side customer for a new user
    async fn create_customer(&self, email: &str) -> Result<String, GatewayError>;

    /// Create and immediately confirm a payment intent on the restaurant's
    /// connected account
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError>;

    /// Re-check an intent after the client completed authentication.
    /// `expected_order_id` is matched against the intent's metadata; a
    /// mismatch means the caller is probing with a foreign intent id.
    async fn confirm_retry(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
        expected_order_id: u64,
    ) -> Result<ConfirmOutcome, GatewayError>;

    /// The payment method a captured intent charged
    async fn intent_payment_method(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
    ) -> Result<IntentCard, GatewayError>;

    /// Provider processing fee for a captured intent. Best effort: `None`
    /// when the balance transaction is not settled yet.
    async fn processing_fee(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
    ) -> Result<Option<Decimal>, GatewayError>;

    /// Client secret for collecting a new card
    async fn create_setup_intent(&self, customer_gateway_id: &str) -> Result<String, GatewayError>;

    /// Saved cards of a customer
    async fn list_cards(&self, customer_gateway_id: &str) -> Result<Vec<CardSummary>, GatewayError>;

    /// Detach a card; false when it did not belong to the customer
    async fn detach_card(
        &self,
        customer_gateway_id: &str,
        payment_method_id: &str,
    ) -> Result<bool, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_charge_boundary() {
        assert!(ensure_chargeable(49).is_err());
        assert!(ensure_chargeable(50).is_ok());
        assert!(ensure_chargeable(51).is_ok());
    }
}
