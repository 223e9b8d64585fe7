//! Entity definitions for the store

pub mod account;
pub mod menu;
pub mod order;
pub mod request;
pub mod restaurant;

pub use account::{Customer, Staff, StaffInvite, User};
pub use menu::{Category, Customization, Meal};
pub use order::{
    NewOrderItem, Order, OrderItem, OrderItemCustomization, OrderItemStatus, OrderStatus,
};
pub use request::{RequestOption, ServiceRequest};
pub use restaurant::{Restaurant, TaxCategory};
