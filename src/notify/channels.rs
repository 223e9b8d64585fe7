//! Private channel naming and authorization
//!
//! ```text
//! private-customer-<customer_id>    order and item updates for one diner
//! private-restaurant-<restaurant_id> staff dashboard fan-out
//! private-server-<staff_id>          per-staff events (restaurant binding)
//! ```
//!
//! Authorization failures are deliberately uniform: a caller probing channel
//! names learns nothing about which part of the check failed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Customer(u64),
    Restaurant(u64),
    Server(u64),
}

impl Channel {
    pub fn name(&self) -> String {
        match self {
            Channel::Customer(id) => format!("private-customer-{id}"),
            Channel::Restaurant(id) => format!("private-restaurant-{id}"),
            Channel::Server(id) => format!("private-server-{id}"),
        }
    }

    pub fn parse(name: &str) -> Option<Channel> {
        if let Some(id) = name.strip_prefix("private-customer-") {
            return id.parse().ok().map(Channel::Customer);
        }
        if let Some(id) = name.strip_prefix("private-restaurant-") {
            return id.parse().ok().map(Channel::Restaurant);
        }
        if let Some(id) = name.strip_prefix("private-server-") {
            return id.parse().ok().map(Channel::Server);
        }
        None
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Uniform refusal, no detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAuthError;

/// A customer may subscribe only to their own customer channel
pub fn authorize_customer(channel_name: &str, customer_id: u64) -> Result<Channel, ChannelAuthError> {
    match Channel::parse(channel_name) {
        Some(Channel::Customer(id)) if id == customer_id => Ok(Channel::Customer(id)),
        _ => Err(ChannelAuthError),
    }
}

/// Staff may subscribe to their own server channel and, once attached, to
/// their restaurant's channel
pub fn authorize_staff(
    channel_name: &str,
    staff_id: u64,
    restaurant_id: Option<u64>,
) -> Result<Channel, ChannelAuthError> {
    match Channel::parse(channel_name) {
        Some(Channel::Server(id)) if id == staff_id => Ok(Channel::Server(id)),
        Some(Channel::Restaurant(id)) if restaurant_id == Some(id) => Ok(Channel::Restaurant(id)),
        _ => Err(ChannelAuthError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for channel in [Channel::Customer(7), Channel::Restaurant(12), Channel::Server(3)] {
            assert_eq!(Channel::parse(&channel.name()), Some(channel));
        }
        assert_eq!(Channel::parse("presence-lobby"), None);
        assert_eq!(Channel::parse("private-customer-abc"), None);
    }

    #[test]
    fn customer_cannot_cross_subscribe() {
        assert!(authorize_customer("private-customer-7", 7).is_ok());
        assert!(authorize_customer("private-customer-8", 7).is_err());
        assert!(authorize_customer("private-restaurant-7", 7).is_err());
    }

    #[test]
    fn staff_scope_is_own_server_and_own_restaurant() {
        assert!(authorize_staff("private-server-3", 3, Some(12)).is_ok());
        assert!(authorize_staff("private-server-4", 3, Some(12)).is_err());
        assert!(authorize_staff("private-restaurant-12", 3, Some(12)).is_ok());
        assert!(authorize_staff("private-restaurant-13", 3, Some(12)).is_err());
        // unattached staff have no restaurant channel
        assert!(authorize_staff("private-restaurant-12", 3, None).is_err());
    }
}
