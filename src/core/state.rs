//! Shared server state
//!
//! [`ServerState`] holds the store and the injected external-service clients.
//! It is `Clone` (cheap `Arc` copies) and handed to every handler through
//! axum's `State` extractor. The payment gateway and the event publisher are
//! trait objects constructed once at startup.

use std::sync::Arc;

use crate::core::Config;
use crate::db::Store;
use crate::notify::{EventPublisher, Notifier, PusherClient};
use crate::orders::OrderService;
use crate::payment::{PaymentGateway, StripeGateway};

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Entity store
    pub store: Store,
    /// Payment provider client
    pub gateway: Arc<dyn PaymentGateway>,
    /// Pub/sub channel client
    pub publisher: Arc<dyn EventPublisher>,
}

impl ServerState {
    /// Build production state: Stripe gateway + Pusher publisher over an
    /// empty store.
    pub fn initialize(config: &Config) -> Self {
        let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key.clone()));
        let publisher = Arc::new(PusherClient::new(config.pusher.clone()));
        Self::with_parts(config.clone(), Store::new(), gateway, publisher)
    }

    /// Build state from explicit parts. Used by tests to inject a mock
    /// gateway and a recording publisher.
    pub fn with_parts(
        config: Config,
        store: Store,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            publisher,
        }
    }

    /// Event fan-out helper bound to the configured publisher
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.publisher.clone())
    }

    /// Order workflow service bound to this state
    pub fn orders(&self) -> OrderService {
        OrderService::new(self.store.clone(), self.gateway.clone(), self.notifier())
    }
}
