//! Order repository
//!
//! Creation, payment bookkeeping, and the listing queries the customer and
//! staff APIs need. Status transitions themselves are decided by the order
//! service; this layer only records them.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::db::models::{NewOrderItem, Order, OrderItem, OrderItemStatus, OrderStatus};
use crate::db::{RepoError, RepoResult, Store};

/// Most recent orders shown to a customer
const CUSTOMER_ORDER_LIMIT: usize = 10;
/// Most recent orders shown on the staff dashboard
const RESTAURANT_ORDER_LIMIT: usize = 20;

#[derive(Clone)]
pub struct OrderRepository {
    store: Store,
}

impl OrderRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Insert a new order in `PROCESSING` together with its items, all
    /// starting in `COOKING`
    pub fn create(
        &self,
        restaurant_id: u64,
        customer_id: u64,
        table: i32,
        subtotal: Decimal,
        tax: Decimal,
        tip: Option<Decimal>,
        total: Decimal,
        items: Vec<NewOrderItem>,
    ) -> Order {
        let order = Order {
            id: self.store.next_id(),
            restaurant_id,
            customer_id: Some(customer_id),
            table,
            placed_at: Utc::now(),
            status: OrderStatus::Processing,
            subtotal,
            tax,
            tip,
            total,
            fee: None,
            payment_intent_id: None,
            tip_payment_intent_id: None,
        };
        self.store.inner().orders.insert(order.id, order.clone());
        for item in items {
            let stored = OrderItem {
                id: self.store.next_id(),
                order_id: order.id,
                status: OrderItemStatus::Cooking,
                meal_name: item.meal_name,
                meal_price: item.meal_price,
                quantity: item.quantity,
                total: item.total,
                customizations: item.customizations,
            };
            self.store.inner().order_items.insert(stored.id, stored);
        }
        order
    }

    pub fn get(&self, order_id: u64) -> RepoResult<Order> {
        self.store
            .inner()
            .orders
            .get(&order_id)
            .map(|o| o.clone())
            .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))
    }

    /// Remove an order and its items. Used when the placement charge is
    /// declined outright.
    pub fn delete(&self, order_id: u64) -> RepoResult<()> {
        self.store
            .inner()
            .orders
            .remove(&order_id)
            .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))?;
        self.store
            .inner()
            .order_items
            .retain(|_, item| item.order_id != order_id);
        Ok(())
    }

    fn update<F: FnOnce(&mut Order)>(&self, order_id: u64, f: F) -> RepoResult<Order> {
        let mut entry = self
            .store
            .inner()
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))?;
        f(&mut entry);
        Ok(entry.clone())
    }

    pub fn set_payment_intent(&self, order_id: u64, intent_id: &str) -> RepoResult<Order> {
        self.update(order_id, |o| {
            o.payment_intent_id = Some(intent_id.to_string())
        })
    }

    pub fn set_tip_payment_intent(&self, order_id: u64, intent_id: &str) -> RepoResult<Order> {
        self.update(order_id, |o| {
            o.tip_payment_intent_id = Some(intent_id.to_string())
        })
    }

    /// Payment captured: the order becomes visible to staff
    pub fn mark_active(&self, order_id: u64, fee: Option<Decimal>) -> RepoResult<Order> {
        self.update(order_id, |o| {
            o.status = OrderStatus::Active;
            if let Some(fee) = fee {
                o.fee = Some(o.fee.unwrap_or(Decimal::ZERO) + fee);
            }
        })
    }

    /// Record a captured tip charge. Tips accumulate: the amount adds to any
    /// tip already on the order, and the total grows by the same amount.
    pub fn apply_tip(
        &self,
        order_id: u64,
        amount: Decimal,
        fee_delta: Option<Decimal>,
    ) -> RepoResult<Order> {
        self.update(order_id, |o| {
            o.tip = Some(o.tip.unwrap_or(Decimal::ZERO) + amount);
            o.total += amount;
            if let Some(delta) = fee_delta {
                o.fee = Some(o.fee.unwrap_or(Decimal::ZERO) + delta);
            }
        })
    }

    pub fn set_status(&self, order_id: u64, status: OrderStatus) -> RepoResult<Order> {
        self.update(order_id, |o| o.status = status)
    }

    // ---- items ----

    pub fn get_item(&self, item_id: u64) -> RepoResult<OrderItem> {
        self.store
            .inner()
            .order_items
            .get(&item_id)
            .map(|i| i.clone())
            .ok_or_else(|| RepoError::NotFound(format!("order item {item_id}")))
    }

    pub fn set_item_status(&self, item_id: u64, status: OrderItemStatus) -> RepoResult<OrderItem> {
        let mut entry = self
            .store
            .inner()
            .order_items
            .get_mut(&item_id)
            .ok_or_else(|| RepoError::NotFound(format!("order item {item_id}")))?;
        entry.status = status;
        Ok(entry.clone())
    }

    /// Items of one order in insertion order
    pub fn items_for_order(&self, order_id: u64) -> Vec<OrderItem> {
        let mut items: Vec<OrderItem> = self
            .store
            .inner()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|i| i.clone())
            .collect();
        items.sort_by_key(|i| i.id);
        items
    }

    pub fn all_items_complete(&self, order_id: u64) -> bool {
        self.store
            .inner()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .all(|i| i.status == OrderItemStatus::Complete)
    }

    /// Resolve a payment intent id back to the customer's order holding it.
    /// `tip_intent` selects between the placement and tip intent columns.
    pub fn find_by_intent(
        &self,
        customer_id: u64,
        intent_id: &str,
        tip_intent: bool,
    ) -> Option<Order> {
        self.store
            .inner()
            .orders
            .iter()
            .find(|o| {
                let held = if tip_intent {
                    o.tip_payment_intent_id.as_deref()
                } else {
                    o.payment_intent_id.as_deref()
                };
                o.customer_id == Some(customer_id) && held == Some(intent_id)
            })
            .map(|o| o.clone())
    }

    /// Customer order history: paid orders only, newest first
    pub fn orders_for_customer(&self, customer_id: u64) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .store
            .inner()
            .orders
            .iter()
            .filter(|o| o.customer_id == Some(customer_id) && o.status != OrderStatus::Processing)
            .map(|o| o.clone())
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        orders.truncate(CUSTOMER_ORDER_LIMIT);
        orders
    }

    /// Staff dashboard: recent paid orders for one restaurant, newest first,
    /// optionally narrowed to one status
    pub fn orders_for_restaurant(
        &self,
        restaurant_id: u64,
        status: Option<OrderStatus>,
    ) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .store
            .inner()
            .orders
            .iter()
            .filter(|o| {
                o.restaurant_id == restaurant_id
                    && o.status != OrderStatus::Processing
                    && status.is_none_or(|s| o.status == s)
            })
            .map(|o| o.clone())
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        orders.truncate(RESTAURANT_ORDER_LIMIT);
        orders
    }

    /// Work queues: items of paid orders in one restaurant with the given
    /// status, oldest order first
    pub fn items_for_restaurant_with_status(
        &self,
        restaurant_id: u64,
        status: OrderItemStatus,
    ) -> Vec<(OrderItem, Order)> {
        let mut pairs: Vec<(OrderItem, Order)> = self
            .store
            .inner()
            .order_items
            .iter()
            .filter(|i| i.status == status)
            .filter_map(|i| {
                let order = self.store.inner().orders.get(&i.order_id)?;
                (order.restaurant_id == restaurant_id && order.status != OrderStatus::Processing)
                    .then(|| (i.clone(), order.clone()))
            })
            .collect();
        pairs.sort_by(|a, b| a.1.placed_at.cmp(&b.1.placed_at).then(a.0.id.cmp(&b.0.id)));
        pairs
    }
}
