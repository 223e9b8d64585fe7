//! Response shapes
//!
//! Field names and formats are part of the mobile-client contract: money as
//! decimal strings, times as `%Y-%m-%dT%H:%M:%SZ`, statuses as their display
//! strings. Customer and staff views of an order differ only in which fields
//! they include, so the order DTOs carry optional fields the staff variant
//! omits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::models::{
    Category, Meal, Order, OrderItem, OrderItemCustomization, OrderItemStatus, RequestOption,
    Restaurant, ServiceRequest,
};
use crate::payment::CardSummary;

pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[derive(Debug, Serialize)]
pub struct RestaurantDto {
    pub id: u64,
    pub name: String,
    pub address: String,
}

impl RestaurantDto {
    pub fn new(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: u64,
    pub name: String,
}

impl CategoryDto {
    pub fn new(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealDto {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Percentage tax rate from the meal's tax category
    pub tax: Decimal,
}

impl MealDto {
    pub fn new(meal: &Meal, tax_rate: Decimal) -> Self {
        Self {
            id: meal.id,
            name: meal.name.clone(),
            description: meal.description.clone(),
            price: meal.price,
            tax: tax_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomizationDto {
    pub id: u64,
    pub name: String,
    pub options: Vec<String>,
    pub price_additions: Vec<Decimal>,
    pub min: u32,
    pub max: u32,
}

impl CustomizationDto {
    pub fn new(c: &crate::db::models::Customization) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            options: c.options.clone(),
            price_additions: c.price_additions.clone(),
            min: c.min,
            max: c.max,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestOptionDto {
    pub id: u64,
    pub name: String,
}

impl RequestOptionDto {
    pub fn new(option: &RequestOption) -> Self {
        Self {
            id: option.id,
            name: option.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestDto {
    pub id: u64,
    pub table: i32,
    pub customer_name: Option<String>,
    pub request_name: String,
    pub time: String,
}

impl RequestDto {
    pub fn new(
        request: &ServiceRequest,
        option_name: &str,
        customer_name: Option<&str>,
    ) -> Self {
        Self {
            id: request.id,
            table: request.table,
            customer_name: customer_name.map(str::to_string),
            request_name: option_name.to_string(),
            time: format_time(&request.requested_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemCustomizationDto {
    pub customization_name: String,
    pub options: Vec<String>,
}

impl OrderItemCustomizationDto {
    fn from_frozen(c: &OrderItemCustomization) -> Self {
        Self {
            customization_name: c.name.clone(),
            options: c.options.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemDto {
    pub id: u64,
    pub meal_name: String,
    pub quantity: u32,
    pub total: Decimal,
    pub status: &'static str,
    pub order_item_cust: Vec<OrderItemCustomizationDto>,
}

impl OrderItemDto {
    pub fn new(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            meal_name: item.meal_name.clone(),
            quantity: item.quantity,
            total: item.total,
            status: item.status.display(),
            order_item_cust: item
                .customizations
                .iter()
                .map(OrderItemCustomizationDto::from_frozen)
                .collect(),
        }
    }
}

/// Order list entry; `restaurant_name` only appears in the customer view
#[derive(Debug, Serialize)]
pub struct OrderSummaryDto {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    pub customer_name: Option<String>,
    pub order_time: String,
    pub status: &'static str,
}

impl OrderSummaryDto {
    pub fn for_customer(order: &Order, restaurant_name: &str, customer_name: Option<&str>) -> Self {
        Self {
            id: order.id,
            restaurant_name: Some(restaurant_name.to_string()),
            customer_name: customer_name.map(str::to_string),
            order_time: format_time(&order.placed_at),
            status: order.status.display(),
        }
    }

    pub fn for_staff(order: &Order, customer_name: Option<&str>) -> Self {
        Self {
            id: order.id,
            restaurant_name: None,
            customer_name: customer_name.map(str::to_string),
            order_time: format_time(&order.placed_at),
            status: order.status.display(),
        }
    }
}

/// Full order breakdown with items bucketed by status.
/// The staff view omits the money breakdown except the total.
#[derive(Debug, Serialize)]
pub struct OrderDetailsDto {
    pub id: u64,
    pub customer_name: Option<String>,
    pub table: i32,
    pub order_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Decimal>,
    pub total: Decimal,
    pub cooking_order_items: Vec<OrderItemDto>,
    pub sending_order_items: Vec<OrderItemDto>,
    pub complete_order_items: Vec<OrderItemDto>,
}

impl OrderDetailsDto {
    fn bucket(items: &[OrderItem], status: OrderItemStatus) -> Vec<OrderItemDto> {
        items
            .iter()
            .filter(|i| i.status == status)
            .map(OrderItemDto::new)
            .collect()
    }

    pub fn for_customer(order: &Order, customer_name: Option<&str>, items: &[OrderItem]) -> Self {
        Self {
            id: order.id,
            customer_name: customer_name.map(str::to_string),
            table: order.table,
            order_time: format_time(&order.placed_at),
            subtotal: Some(order.subtotal),
            tax: Some(order.tax),
            tip: order.tip,
            total: order.total,
            cooking_order_items: Self::bucket(items, OrderItemStatus::Cooking),
            sending_order_items: Self::bucket(items, OrderItemStatus::Sending),
            complete_order_items: Self::bucket(items, OrderItemStatus::Complete),
        }
    }

    pub fn for_staff(order: &Order, customer_name: Option<&str>, items: &[OrderItem]) -> Self {
        Self {
            subtotal: None,
            tax: None,
            tip: None,
            ..Self::for_customer(order, customer_name, items)
        }
    }
}

/// Kitchen queue entry
#[derive(Debug, Serialize)]
pub struct OrderItemToCookDto {
    pub id: u64,
    pub order_id: u64,
    pub meal_name: String,
    pub quantity: u32,
    pub order_item_cust: Vec<OrderItemCustomizationDto>,
}

impl OrderItemToCookDto {
    pub fn new(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            meal_name: item.meal_name.clone(),
            quantity: item.quantity,
            order_item_cust: item
                .customizations
                .iter()
                .map(OrderItemCustomizationDto::from_frozen)
                .collect(),
        }
    }
}

/// Delivery queue entry
#[derive(Debug, Serialize)]
pub struct OrderItemToSendDto {
    pub id: u64,
    pub order_id: u64,
    pub customer_name: Option<String>,
    pub table: i32,
    pub meal_name: String,
    pub time: String,
}

impl OrderItemToSendDto {
    pub fn new(item: &OrderItem, order: &Order, customer_name: Option<&str>) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            customer_name: customer_name.map(str::to_string),
            table: order.table,
            meal_name: item.meal_name.clone(),
            time: format_time(&order.placed_at),
        }
    }
}

/// Combined delivery queue: items ready to send and open service requests,
/// merged and sorted by time
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendQueueEntryDto {
    OrderItem(OrderItemToSendDto),
    Request(RequestDto),
}

impl SendQueueEntryDto {
    pub fn time(&self) -> &str {
        match self {
            SendQueueEntryDto::OrderItem(i) => &i.time,
            SendQueueEntryDto::Request(r) => &r.time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CardDto {
    pub payment_method_id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
}

impl CardDto {
    pub fn new(card: &CardSummary) -> Self {
        Self {
            payment_method_id: card.payment_method_id.clone(),
            brand: card.brand.clone(),
            last4: card.last4.clone(),
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }
    }
}
