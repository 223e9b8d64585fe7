//! Staff endpoints
//!
//! Every endpoint except login requires an attached restaurant; unattached
//! staff get `restaurant_not_set`.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::api::dto::{
    OrderDetailsDto, OrderItemToCookDto, OrderItemToSendDto, OrderSummaryDto, RequestDto,
    SendQueueEntryDto,
};
use crate::auth::{ActiveStaff, CurrentUser};
use crate::core::ServerState;
use crate::db::models::{Order, OrderItemStatus};
use crate::notify::channels::authorize_staff;
use crate::utils::{ApiError, ApiResult, Empty, success, success_empty};

fn customer_name(state: &ServerState, order: &Order) -> Option<String> {
    let accounts = state.store.accounts();
    let customer = accounts.get_customer(order.customer_id?).ok()?;
    accounts.get_user(customer.user_id).ok()?.name
}

// ---- login / account ----

/// First call after token auth. Creates the staff profile on demand and
/// consumes a pending restaurant invite if one exists for this email.
pub async fn login(
    State(state): State<ServerState>,
    CurrentUser { user }: CurrentUser,
) -> ApiResult<Empty> {
    let accounts = state.store.accounts();
    if accounts.staff_for_user(user.id).is_none() {
        let staff = accounts.create_staff(user.id, None);
        if let Some(restaurant_id) = accounts.accept_invite(&user.email) {
            accounts
                .attach_staff_to_restaurant(staff.id, restaurant_id)
                .map_err(|e| ApiError::internal(e.to_string()))?;
            state.notifier().restaurant_added(staff.id, restaurant_id).await;
        }
    }
    if user.name.is_none() {
        return Err(ApiError::NameNotSet);
    }
    Ok(success_empty())
}

#[derive(Serialize)]
pub struct InfoBody {
    pub name: Option<String>,
    pub email: String,
    pub restaurant_name: String,
}

pub async fn get_info(
    State(state): State<ServerState>,
    ActiveStaff { user, staff }: ActiveStaff,
) -> ApiResult<InfoBody> {
    let restaurant_name = match staff.restaurant_id {
        Some(id) => state
            .store
            .catalog()
            .get_restaurant(id)
            .map(|r| r.name)
            .unwrap_or_else(|_| "none".to_string()),
        None => "none".to_string(),
    };
    Ok(success(InfoBody {
        name: user.name,
        email: user.email,
        restaurant_name,
    }))
}

// ---- channel auth ----

#[derive(Deserialize)]
pub struct PusherAuthBody {
    pub channel_name: String,
    pub socket_id: String,
}

#[derive(Serialize)]
pub struct PusherAuthResponse {
    pub auth: String,
}

pub async fn pusher_auth(
    State(state): State<ServerState>,
    ActiveStaff { staff, .. }: ActiveStaff,
    Json(body): Json<PusherAuthBody>,
) -> Result<Json<PusherAuthResponse>, ApiError> {
    let channel = authorize_staff(&body.channel_name, staff.id, staff.restaurant_id)
        .map_err(|_| ApiError::ChannelAuthRefused)?;
    let auth = state
        .publisher
        .subscription_token(&body.socket_id, &channel);
    Ok(Json(PusherAuthResponse { auth }))
}

// ---- orders ----

#[derive(Serialize)]
pub struct OrdersBody {
    pub orders: Vec<OrderSummaryDto>,
}

pub async fn get_orders(
    State(state): State<ServerState>,
    staff: ActiveStaff,
) -> ApiResult<OrdersBody> {
    let restaurant_id = staff.restaurant_id()?;
    let orders = state
        .store
        .orders()
        .orders_for_restaurant(restaurant_id, None)
        .iter()
        .map(|order| OrderSummaryDto::for_staff(order, customer_name(&state, order).as_deref()))
        .collect();
    Ok(success(OrdersBody { orders }))
}

#[derive(Serialize)]
pub struct OrderBody {
    pub order: OrderSummaryDto,
}

pub async fn get_order(
    State(state): State<ServerState>,
    staff: ActiveStaff,
    Path(order_id): Path<u64>,
) -> ApiResult<OrderBody> {
    let restaurant_id = staff.restaurant_id()?;
    let order = state
        .store
        .orders()
        .get(order_id)
        .map_err(|_| ApiError::OrderDoesNotExist)?;
    if order.restaurant_id != restaurant_id {
        return Err(ApiError::InvalidRequest);
    }
    Ok(success(OrderBody {
        order: OrderSummaryDto::for_staff(&order, customer_name(&state, &order).as_deref()),
    }))
}

#[derive(Serialize)]
pub struct OrderDetailsBody {
    pub order_details: OrderDetailsDto,
}

pub async fn get_order_details(
    State(state): State<ServerState>,
    staff: ActiveStaff,
    Path(order_id): Path<u64>,
) -> ApiResult<OrderDetailsBody> {
    let restaurant_id = staff.restaurant_id()?;
    let orders = state.store.orders();
    let order = orders
        .get(order_id)
        .map_err(|_| ApiError::OrderDoesNotExist)?;
    if order.restaurant_id != restaurant_id {
        return Err(ApiError::InvalidRequest);
    }
    let items = orders.items_for_order(order.id);
    Ok(success(OrderDetailsBody {
        order_details: OrderDetailsDto::for_staff(
            &order,
            customer_name(&state, &order).as_deref(),
            &items,
        ),
    }))
}

// ---- work queues ----

#[derive(Serialize)]
pub struct ItemsToCookBody {
    pub order_items: Vec<OrderItemToCookDto>,
}

pub async fn get_order_items_to_cook(
    State(state): State<ServerState>,
    staff: ActiveStaff,
) -> ApiResult<ItemsToCookBody> {
    let restaurant_id = staff.restaurant_id()?;
    let order_items = state
        .store
        .orders()
        .items_for_restaurant_with_status(restaurant_id, OrderItemStatus::Cooking)
        .iter()
        .map(|(item, _)| OrderItemToCookDto::new(item))
        .collect();
    Ok(success(ItemsToCookBody { order_items }))
}

#[derive(Serialize)]
pub struct ItemsToSendBody {
    pub items: Vec<SendQueueEntryDto>,
}

/// Items ready to leave the kitchen and open service requests, merged into
/// one queue sorted by time
pub async fn get_items_to_send(
    State(state): State<ServerState>,
    staff: ActiveStaff,
) -> ApiResult<ItemsToSendBody> {
    let restaurant_id = staff.restaurant_id()?;
    let accounts = state.store.accounts();

    let mut items: Vec<SendQueueEntryDto> = state
        .store
        .orders()
        .items_for_restaurant_with_status(restaurant_id, OrderItemStatus::Sending)
        .iter()
        .map(|(item, order)| {
            SendQueueEntryDto::OrderItem(OrderItemToSendDto::new(
                item,
                order,
                customer_name(&state, order).as_deref(),
            ))
        })
        .collect();

    for (request, option) in state.store.requests().open_for_restaurant(restaurant_id) {
        let name = accounts
            .get_customer(request.customer_id)
            .ok()
            .and_then(|c| accounts.get_user(c.user_id).ok())
            .and_then(|u| u.name);
        items.push(SendQueueEntryDto::Request(RequestDto::new(
            &request,
            &option.name,
            name.as_deref(),
        )));
    }

    items.sort_by(|a, b| a.time().cmp(b.time()));
    Ok(success(ItemsToSendBody { items }))
}

#[derive(Deserialize)]
pub struct UpdateItemStatusBody {
    pub order_item_id: u64,
    pub status: OrderItemStatus,
}

pub async fn update_order_item_status(
    State(state): State<ServerState>,
    staff: ActiveStaff,
    Json(body): Json<UpdateItemStatusBody>,
) -> ApiResult<Empty> {
    let restaurant_id = staff.restaurant_id()?;
    state
        .orders()
        .update_item_status(restaurant_id, body.order_item_id, body.status)
        .await?;
    Ok(success_empty())
}

// ---- service requests ----

#[derive(Deserialize)]
pub struct DeleteRequestBody {
    pub id: u64,
}

pub async fn delete_request(
    State(state): State<ServerState>,
    staff: ActiveStaff,
    Json(body): Json<DeleteRequestBody>,
) -> ApiResult<Empty> {
    let restaurant_id = staff.restaurant_id()?;
    state
        .orders()
        .delete_request(restaurant_id, body.id)
        .await?;
    Ok(success_empty())
}
