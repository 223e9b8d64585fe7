//! Typed event fan-out
//!
//! One method per business event, each deciding which channels hear about
//! it. Failures are logged and dropped so a notification outage never turns
//! into a failed order.
//!
//! Channel/event layout:
//!
//! customer channel: order-placed, order-status-updated, item-status-updated,
//!                   tip-added-order-<id>, request-made
//! restaurant channel: all of the above plus request-deleted
//! server channel: restaurant-added

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::api::dto::{
    OrderItemDto, OrderItemToCookDto, OrderItemToSendDto, OrderSummaryDto, RequestDto,
};
use crate::db::models::{Order, OrderItem, OrderItemStatus};

use super::{Channel, EventPublisher};

#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn EventPublisher>,
}

impl Notifier {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    async fn send(&self, channels: &[Channel], event: &str, payload: serde_json::Value) {
        if let Err(e) = self.publisher.publish(channels, event, payload).await {
            warn!(event, error = %e, "Event publish failed");
        }
    }

    fn order_channels(order: &Order) -> Vec<Channel> {
        let mut channels = Vec::with_capacity(2);
        if let Some(customer_id) = order.customer_id {
            channels.push(Channel::Customer(customer_id));
        }
        channels.push(Channel::Restaurant(order.restaurant_id));
        channels
    }

    /// A paid order landed: the customer gets the summary, the kitchen also
    /// gets the items to cook
    pub async fn order_placed(
        &self,
        order: &Order,
        summary: &OrderSummaryDto,
        items_to_cook: &[OrderItemToCookDto],
    ) {
        if let Some(customer_id) = order.customer_id {
            self.send(
                &[Channel::Customer(customer_id)],
                "order-placed",
                json!({ "order": summary }),
            )
            .await;
        }
        self.send(
            &[Channel::Restaurant(order.restaurant_id)],
            "order-placed",
            json!({ "order": summary, "order_items": items_to_cook }),
        )
        .await;
    }

    pub async fn order_status_updated(&self, order: &Order) {
        self.send(
            &Self::order_channels(order),
            "order-status-updated",
            json!({ "order_id": order.id, "new_status": order.status.display() }),
        )
        .await;
    }

    /// Item moved through the kitchen; the payload shape follows the queue
    /// the item just entered
    pub async fn item_status_updated(
        &self,
        order: &Order,
        item: &OrderItem,
        customer_name: Option<&str>,
    ) {
        let serialized = match item.status {
            OrderItemStatus::Cooking => serde_json::to_value(OrderItemToCookDto::new(item)),
            OrderItemStatus::Sending => {
                serde_json::to_value(OrderItemToSendDto::new(item, order, customer_name))
            }
            OrderItemStatus::Complete => serde_json::to_value(OrderItemDto::new(item)),
        };
        let serialized = match serialized {
            Ok(v) => v,
            Err(e) => {
                warn!(item_id = item.id, error = %e, "Item payload serialization failed");
                return;
            }
        };
        self.send(
            &Self::order_channels(order),
            "item-status-updated",
            json!({
                "order_item": serialized,
                "id": item.id,
                "order_id": order.id,
                "status": item.status,
            }),
        )
        .await;
    }

    /// Tip applied; amounts are sent as strings, event name carries the
    /// order id so clients can bind per-order listeners
    pub async fn tip_added(&self, order: &Order) {
        let event = format!("tip-added-order-{}", order.id);
        self.send(
            &Self::order_channels(order),
            &event,
            json!({
                "updated_subtotal": order.subtotal.to_string(),
                "updated_tax": order.tax.to_string(),
                "updated_tip": order.tip.map(|t| t.to_string()),
                "updated_total": order.total.to_string(),
            }),
        )
        .await;
    }

    pub async fn request_made(&self, customer_id: u64, restaurant_id: u64, request: &RequestDto) {
        self.send(
            &[Channel::Customer(customer_id), Channel::Restaurant(restaurant_id)],
            "request-made",
            json!({ "request": request }),
        )
        .await;
    }

    pub async fn request_deleted(&self, restaurant_id: u64, request_id: u64) {
        self.send(
            &[Channel::Restaurant(restaurant_id)],
            "request-deleted",
            json!({ "request_id": request_id }),
        )
        .await;
    }

    /// Staff member just got bound to a restaurant via an accepted invite
    pub async fn restaurant_added(&self, staff_id: u64, restaurant_id: u64) {
        self.send(
            &[Channel::Server(staff_id)],
            "restaurant-added",
            json!({ "restaurant_id": restaurant_id }),
        )
        .await;
    }
}
