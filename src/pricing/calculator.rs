//! Pure cart pricing
//!
//! Prices a validated cart against menu data the caller has already loaded.
//! Tax is accumulated unrounded across lines and rounded exactly once at the
//! end, half-up. Rounding per line would drift from the reference totals on
//! multi-line carts.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::models::{Customization, Meal, OrderItemCustomization};

/// Round a money amount to cents, half-up
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("meal '{meal_name}' is disabled")]
    MealDisabled { meal_name: String },

    #[error("customization option index out of range")]
    OptionIndexOutOfRange,

    #[error("quantity must be positive")]
    ZeroQuantity,
}

/// One selected customization group with the option indices the diner picked
#[derive(Debug)]
pub struct CartSelection<'a> {
    pub customization: &'a Customization,
    pub option_indices: Vec<usize>,
}

/// One cart line: a meal, its applicable tax rate, and the selections
#[derive(Debug)]
pub struct CartLine<'a> {
    pub meal: &'a Meal,
    /// Percentage rate from the meal's tax category
    pub tax_rate: Decimal,
    pub quantity: u32,
    pub selections: Vec<CartSelection<'a>>,
}

/// Priced line ready to be frozen onto an order item
#[derive(Debug)]
pub struct PricedItem {
    pub meal_name: String,
    pub meal_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub customizations: Vec<OrderItemCustomization>,
}

#[derive(Debug)]
pub struct PricedCart {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub tip: Option<Decimal>,
    /// subtotal + tax + tip
    pub total: Decimal,
    pub items: Vec<PricedItem>,
}

/// Price a cart.
///
/// Every meal is checked for availability before any arithmetic, so a cart
/// holding one disabled meal is rejected whole.
pub fn price_cart(lines: &[CartLine], tip: Option<Decimal>) -> Result<PricedCart, PricingError> {
    for line in lines {
        if !line.meal.enabled {
            return Err(PricingError::MealDisabled {
                meal_name: line.meal.name.clone(),
            });
        }
        if line.quantity == 0 {
            return Err(PricingError::ZeroQuantity);
        }
    }

    let mut subtotal = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let mut unit_price = line.meal.price;
        let mut frozen = Vec::with_capacity(line.selections.len());

        for selection in &line.selections {
            let group = selection.customization;
            let mut options = Vec::with_capacity(selection.option_indices.len());
            let mut additions = Vec::with_capacity(selection.option_indices.len());
            for &idx in &selection.option_indices {
                let option = group
                    .options
                    .get(idx)
                    .ok_or(PricingError::OptionIndexOutOfRange)?;
                let addition = group
                    .price_additions
                    .get(idx)
                    .ok_or(PricingError::OptionIndexOutOfRange)?;
                unit_price += *addition;
                options.push(option.clone());
                additions.push(*addition);
            }
            frozen.push(OrderItemCustomization {
                name: group.name.clone(),
                options,
                price_additions: additions,
            });
        }

        let line_total = unit_price * Decimal::from(line.quantity);
        subtotal += line_total;
        // unrounded accumulation; rounded once below
        tax += line_total * line.tax_rate / Decimal::from(100);

        items.push(PricedItem {
            meal_name: line.meal.name.clone(),
            meal_price: line.meal.price,
            quantity: line.quantity,
            total: line_total,
            customizations: frozen,
        });
    }

    let tax = round_money(tax);
    let tip = tip.map(round_money);
    let total = subtotal + tax + tip.unwrap_or(Decimal::ZERO);

    Ok(PricedCart {
        subtotal,
        tax,
        tip,
        total,
        items,
    })
}
