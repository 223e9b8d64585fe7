//! Real-time event fan-out
//!
//! Channel naming and authorization, the [`EventPublisher`] seam, the Pusher
//! REST client behind it, and the typed event helpers the order workflow
//! calls. Publish failures are logged and swallowed; a dropped notification
//! never fails the request that caused it.

pub mod channels;
pub mod events;
pub mod pusher;

use async_trait::async_trait;
use serde_json::Value;

pub use channels::{Channel, ChannelAuthError};
pub use events::Notifier;
pub use pusher::PusherClient;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("publish failed: {0}")]
    Api(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver one event to a set of channels
    async fn publish(
        &self,
        channels: &[Channel],
        event: &str,
        payload: Value,
    ) -> Result<(), NotifyError>;

    /// Signed token proving the holder may subscribe to a private channel
    fn subscription_token(&self, socket_id: &str, channel: &Channel) -> String;
}
