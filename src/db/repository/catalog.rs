//! Catalog repository: restaurants, tax categories, menu structure

use rust_decimal::Decimal;

use crate::db::models::restaurant::DEFAULT_TAX_CATEGORY;
use crate::db::models::{Category, Customization, Meal, Restaurant, TaxCategory};
use crate::db::{RepoError, RepoResult, Store};

#[derive(Clone)]
pub struct CatalogRepository {
    store: Store,
}

impl CatalogRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // ---- restaurants ----

    /// All restaurants, sorted by name
    pub fn list_restaurants(&self) -> Vec<Restaurant> {
        let mut all: Vec<Restaurant> = self
            .store
            .inner()
            .restaurants
            .iter()
            .map(|r| r.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn get_restaurant(&self, restaurant_id: u64) -> RepoResult<Restaurant> {
        self.store
            .inner()
            .restaurants
            .get(&restaurant_id)
            .map(|r| r.clone())
            .ok_or_else(|| RepoError::NotFound(format!("restaurant {restaurant_id}")))
    }

    /// Create a restaurant together with its protected `Default` tax category
    pub fn create_restaurant(
        &self,
        name: &str,
        address: &str,
        timezone: &str,
        gateway_account_id: &str,
    ) -> Restaurant {
        let restaurant = Restaurant {
            id: self.store.next_id(),
            name: name.to_string(),
            address: address.to_string(),
            timezone: timezone.to_string(),
            gateway_account_id: gateway_account_id.to_string(),
        };
        self.store
            .inner()
            .restaurants
            .insert(restaurant.id, restaurant.clone());
        let default = TaxCategory {
            id: self.store.next_id(),
            restaurant_id: restaurant.id,
            name: DEFAULT_TAX_CATEGORY.to_string(),
            rate: Decimal::ZERO,
        };
        self.store
            .inner()
            .tax_categories
            .insert(default.id, default);
        restaurant
    }

    // ---- tax categories ----

    pub fn get_tax_category(&self, tax_category_id: u64) -> RepoResult<TaxCategory> {
        self.store
            .inner()
            .tax_categories
            .get(&tax_category_id)
            .map(|t| t.clone())
            .ok_or_else(|| RepoError::NotFound(format!("tax category {tax_category_id}")))
    }

    pub fn default_tax_category(&self, restaurant_id: u64) -> RepoResult<TaxCategory> {
        self.store
            .inner()
            .tax_categories
            .iter()
            .find(|t| t.restaurant_id == restaurant_id && t.name == DEFAULT_TAX_CATEGORY)
            .map(|t| t.clone())
            .ok_or_else(|| {
                RepoError::NotFound(format!("default tax category for restaurant {restaurant_id}"))
            })
    }

    /// Category names are unique within a restaurant
    pub fn create_tax_category(
        &self,
        restaurant_id: u64,
        name: &str,
        rate: Decimal,
    ) -> RepoResult<TaxCategory> {
        let duplicate = self
            .store
            .inner()
            .tax_categories
            .iter()
            .any(|t| t.restaurant_id == restaurant_id && t.name == name);
        if duplicate {
            return Err(RepoError::Duplicate(format!("tax category '{name}'")));
        }
        let category = TaxCategory {
            id: self.store.next_id(),
            restaurant_id,
            name: name.to_string(),
            rate,
        };
        self.store
            .inner()
            .tax_categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    /// Delete a tax category; meals that referenced it fall back to the
    /// restaurant's `Default` category. The `Default` category itself is
    /// protected.
    pub fn delete_tax_category(&self, tax_category_id: u64) -> RepoResult<()> {
        let category = self.get_tax_category(tax_category_id)?;
        if category.name == DEFAULT_TAX_CATEGORY {
            return Err(RepoError::DefaultTaxCategory);
        }
        let default = self.default_tax_category(category.restaurant_id)?;
        for mut meal in self.store.inner().meals.iter_mut() {
            if meal.tax_category_id == tax_category_id {
                meal.tax_category_id = default.id;
            }
        }
        self.store.inner().tax_categories.remove(&tax_category_id);
        Ok(())
    }

    // ---- categories ----

    pub fn get_category(&self, category_id: u64) -> RepoResult<Category> {
        self.store
            .inner()
            .categories
            .get(&category_id)
            .map(|c| c.clone())
            .ok_or_else(|| RepoError::NotFound(format!("category {category_id}")))
    }

    /// Menu categories of a restaurant, sorted by name
    pub fn categories_for_restaurant(&self, restaurant_id: u64) -> Vec<Category> {
        let mut all: Vec<Category> = self
            .store
            .inner()
            .categories
            .iter()
            .filter(|c| c.restaurant_id == restaurant_id)
            .map(|c| c.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create_category(&self, restaurant_id: u64, name: &str) -> Category {
        let category = Category {
            id: self.store.next_id(),
            restaurant_id,
            name: name.to_string(),
        };
        self.store
            .inner()
            .categories
            .insert(category.id, category.clone());
        category
    }

    // ---- meals ----

    pub fn get_meal(&self, meal_id: u64) -> RepoResult<Meal> {
        self.store
            .inner()
            .meals
            .get(&meal_id)
            .map(|m| m.clone())
            .ok_or_else(|| RepoError::NotFound(format!("meal {meal_id}")))
    }

    /// Enabled meals in one category, sorted by name
    pub fn meals_for_category(&self, category_id: u64) -> Vec<Meal> {
        let mut all: Vec<Meal> = self
            .store
            .inner()
            .meals
            .iter()
            .filter(|m| m.category_id == category_id && m.enabled)
            .map(|m| m.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Enabled meals across the whole restaurant, sorted by name
    pub fn meals_for_restaurant(&self, restaurant_id: u64) -> Vec<Meal> {
        let category_ids: Vec<u64> = self
            .store
            .inner()
            .categories
            .iter()
            .filter(|c| c.restaurant_id == restaurant_id)
            .map(|c| c.id)
            .collect();
        let mut all: Vec<Meal> = self
            .store
            .inner()
            .meals
            .iter()
            .filter(|m| m.enabled && category_ids.contains(&m.category_id))
            .map(|m| m.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create_meal(
        &self,
        category_id: u64,
        name: &str,
        description: &str,
        price: Decimal,
        tax_category_id: u64,
    ) -> Meal {
        let meal = Meal {
            id: self.store.next_id(),
            category_id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            tax_category_id,
            enabled: true,
        };
        self.store.inner().meals.insert(meal.id, meal.clone());
        meal
    }

    pub fn set_meal_enabled(&self, meal_id: u64, enabled: bool) -> RepoResult<()> {
        let mut entry = self
            .store
            .inner()
            .meals
            .get_mut(&meal_id)
            .ok_or_else(|| RepoError::NotFound(format!("meal {meal_id}")))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Percentage tax rate that applies to a meal
    pub fn tax_rate_for_meal(&self, meal: &Meal) -> RepoResult<Decimal> {
        Ok(self.get_tax_category(meal.tax_category_id)?.rate)
    }

    // ---- customizations ----

    pub fn get_customization(&self, customization_id: u64) -> RepoResult<Customization> {
        self.store
            .inner()
            .customizations
            .get(&customization_id)
            .map(|c| c.clone())
            .ok_or_else(|| RepoError::NotFound(format!("customization {customization_id}")))
    }

    /// Customization groups of a meal, sorted by name
    pub fn customizations_for_meal(&self, meal_id: u64) -> Vec<Customization> {
        let mut all: Vec<Customization> = self
            .store
            .inner()
            .customizations
            .iter()
            .filter(|c| c.meal_id == meal_id)
            .map(|c| c.clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create_customization(&self, customization: Customization) -> RepoResult<Customization> {
        customization.validate().map_err(RepoError::Validation)?;
        let stored = Customization {
            id: self.store.next_id(),
            ..customization
        };
        self.store
            .inner()
            .customizations
            .insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Store, Restaurant) {
        let store = Store::new();
        let restaurant = store
            .catalog()
            .create_restaurant("Thai Basil", "1 Main St", "America/Detroit", "acct_1");
        (store, restaurant)
    }

    #[test]
    fn restaurant_gets_default_tax_category() {
        let (store, restaurant) = seeded();
        let default = store.catalog().default_tax_category(restaurant.id).unwrap();
        assert_eq!(default.rate, Decimal::ZERO);
    }

    #[test]
    fn default_tax_category_cannot_be_deleted() {
        let (store, restaurant) = seeded();
        let default = store.catalog().default_tax_category(restaurant.id).unwrap();
        assert!(matches!(
            store.catalog().delete_tax_category(default.id),
            Err(RepoError::DefaultTaxCategory)
        ));
    }

    #[test]
    fn deleting_tax_category_reassigns_meals_to_default() {
        let (store, restaurant) = seeded();
        let catalog = store.catalog();
        let food_tax = catalog
            .create_tax_category(restaurant.id, "Food", Decimal::new(6, 0))
            .unwrap();
        let category = catalog.create_category(restaurant.id, "Entrees");
        let meal = catalog.create_meal(category.id, "Pad Thai", "", Decimal::new(1200, 2), food_tax.id);

        catalog.delete_tax_category(food_tax.id).unwrap();

        let default = catalog.default_tax_category(restaurant.id).unwrap();
        assert_eq!(catalog.get_meal(meal.id).unwrap().tax_category_id, default.id);
    }

    #[test]
    fn disabled_meals_are_filtered_from_listings() {
        let (store, restaurant) = seeded();
        let catalog = store.catalog();
        let default = catalog.default_tax_category(restaurant.id).unwrap();
        let category = catalog.create_category(restaurant.id, "Entrees");
        let meal = catalog.create_meal(category.id, "Pad Thai", "", Decimal::new(1200, 2), default.id);

        assert_eq!(catalog.meals_for_category(category.id).len(), 1);
        catalog.set_meal_enabled(meal.id, false).unwrap();
        assert!(catalog.meals_for_category(category.id).is_empty());
        // still directly fetchable
        assert!(catalog.get_meal(meal.id).is_ok());
    }
}
