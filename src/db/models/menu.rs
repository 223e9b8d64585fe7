//! Menu structure: categories, meals, customizations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub restaurant_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub tax_category_id: u64,
    /// Disabled meals stay on the menu but cannot be ordered
    pub enabled: bool,
}

/// Customization group attached to a meal
///
/// `options` and `price_additions` are parallel: picking option `i` adds
/// `price_additions[i]` to the meal's unit price. `min`/`max` bound how
/// many options a diner may pick from this group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customization {
    pub id: u64,
    pub meal_id: u64,
    pub name: String,
    pub options: Vec<String>,
    pub price_additions: Vec<Decimal>,
    pub min: u32,
    pub max: u32,
}

impl Customization {
    /// Structural validity: parallel arrays match and bounds are coherent
    pub fn validate(&self) -> Result<(), String> {
        if self.options.is_empty() {
            return Err("customization needs at least one option".into());
        }
        if self.options.len() != self.price_additions.len() {
            return Err(format!(
                "options ({}) and price_additions ({}) must have the same length",
                self.options.len(),
                self.price_additions.len()
            ));
        }
        if self.min > self.max {
            return Err("min cannot exceed max".into());
        }
        if self.max as usize > self.options.len() {
            return Err("max cannot exceed the number of options".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Customization {
        Customization {
            id: 1,
            meal_id: 1,
            name: "Size".into(),
            options: vec!["Small".into(), "Large".into()],
            price_additions: vec![Decimal::ZERO, Decimal::new(200, 2)],
            min: 1,
            max: 1,
        }
    }

    #[test]
    fn valid_customization_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn mismatched_parallel_arrays_fail() {
        let mut c = base();
        c.price_additions.pop();
        assert!(c.validate().is_err());
    }

    #[test]
    fn min_above_max_fails() {
        let mut c = base();
        c.min = 2;
        c.max = 1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn max_above_option_count_fails() {
        let mut c = base();
        c.max = 5;
        assert!(c.validate().is_err());
    }
}
