//! Cart pricing

pub mod calculator;

pub use calculator::{
    CartLine, CartSelection, PricedCart, PricedItem, PricingError, price_cart, round_money,
};
