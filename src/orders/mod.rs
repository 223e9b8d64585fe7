//! Order workflow

pub mod service;

pub use service::{
    CustomizationInput, OrderLineInput, OrderService, PaymentOutcomeBody, PlaceOrderInput,
};
