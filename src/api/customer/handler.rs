//! Customer endpoints
//!
//! Menu browsing is unauthenticated. Everything touching accounts, orders,
//! or cards goes through the token extractors.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::dto::{
    CardDto, CategoryDto, CustomizationDto, MealDto, OrderDetailsDto, OrderSummaryDto,
    RequestOptionDto, RestaurantDto,
};
use crate::auth::{ActiveCustomer, CurrentUser};
use crate::core::ServerState;
use crate::notify::channels::authorize_customer;
use crate::orders::{CustomizationInput, OrderLineInput, PaymentOutcomeBody, PlaceOrderInput};
use crate::utils::{ApiError, ApiResult, Empty, success, success_empty};

// ---- login / account ----

#[derive(Serialize)]
pub struct LoginBody {
    pub id: u64,
    pub name_set: bool,
}

/// First call after token auth; creates the customer profile and its
/// provider-side customer on demand
pub async fn login(
    State(state): State<ServerState>,
    CurrentUser { user }: CurrentUser,
) -> ApiResult<LoginBody> {
    let accounts = state.store.accounts();
    let customer = match accounts.customer_for_user(user.id) {
        Some(c) => c,
        None => {
            let gateway_customer_id = state.gateway.create_customer(&user.email).await?;
            accounts.create_customer(user.id, &gateway_customer_id)
        }
    };
    Ok(success(LoginBody {
        id: customer.id,
        name_set: user.name.is_some(),
    }))
}

#[derive(Serialize)]
pub struct InfoBody {
    pub name: Option<String>,
    pub email: String,
}

pub async fn get_info(CurrentUser { user }: CurrentUser) -> ApiResult<InfoBody> {
    Ok(success(InfoBody {
        name: user.name,
        email: user.email,
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

/// Private channel authorization; refusals are a uniform 403
pub async fn pusher_auth(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
    Json(body): Json<PusherAuthBody>,
) -> Result<Json<PusherAuthResponse>, ApiError> {
    let channel = authorize_customer(&body.channel_name, customer.id)
        .map_err(|_| ApiError::ChannelAuthRefused)?;
    let auth = state
        .publisher
        .subscription_token(&body.socket_id, &channel);
    Ok(Json(PusherAuthResponse { auth }))
}

// ---- menu browsing ----

#[derive(Serialize)]
pub struct RestaurantsBody {
    pub restaurants: Vec<RestaurantDto>,
}

pub async fn get_restaurants(State(state): State<ServerState>) -> ApiResult<RestaurantsBody> {
    let restaurants = state
        .store
        .catalog()
        .list_restaurants()
        .iter()
        .map(RestaurantDto::new)
        .collect();
    Ok(success(RestaurantsBody { restaurants }))
}

#[derive(Serialize)]
pub struct RestaurantBody {
    pub restaurant: RestaurantDto,
    pub request_options: Vec<RequestOptionDto>,
}

pub async fn get_restaurant(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<u64>,
) -> ApiResult<RestaurantBody> {
    let restaurant = state
        .store
        .catalog()
        .get_restaurant(restaurant_id)
        .map_err(|_| ApiError::RestaurantDoesNotExist)?;
    let request_options = state
        .store
        .requests()
        .options_for_restaurant(restaurant_id)
        .iter()
        .map(RequestOptionDto::new)
        .collect();
    Ok(success(RestaurantBody {
        restaurant: RestaurantDto::new(&restaurant),
        request_options,
    }))
}

#[derive(Serialize)]
pub struct CategoriesBody {
    pub categories: Vec<CategoryDto>,
}

pub async fn get_categories(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<u64>,
) -> ApiResult<CategoriesBody> {
    let catalog = state.store.catalog();
    catalog
        .get_restaurant(restaurant_id)
        .map_err(|_| ApiError::RestaurantDoesNotExist)?;
    let categories = catalog
        .categories_for_restaurant(restaurant_id)
        .iter()
        .map(CategoryDto::new)
        .collect();
    Ok(success(CategoriesBody { categories }))
}

#[derive(Serialize)]
pub struct MealsBody {
    pub meals: Vec<MealDto>,
}

/// `category_id` 0 lists the whole menu
pub async fn get_meals(
    State(state): State<ServerState>,
    Path((restaurant_id, category_id)): Path<(u64, u64)>,
) -> ApiResult<MealsBody> {
    let catalog = state.store.catalog();
    catalog
        .get_restaurant(restaurant_id)
        .map_err(|_| ApiError::RestaurantDoesNotExist)?;

    let meals = if category_id == 0 {
        catalog.meals_for_restaurant(restaurant_id)
    } else {
        let category = catalog
            .get_category(category_id)
            .map_err(|_| ApiError::CategoryDoesNotExist)?;
        if category.restaurant_id != restaurant_id {
            return Err(ApiError::CategoryDoesNotExist);
        }
        catalog.meals_for_category(category_id)
    };

    let mut dtos = Vec::with_capacity(meals.len());
    for meal in &meals {
        let tax = catalog
            .tax_rate_for_meal(meal)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        dtos.push(MealDto::new(meal, tax));
    }
    Ok(success(MealsBody { meals: dtos }))
}

#[derive(Serialize)]
pub struct MealBody {
    pub customizations: Vec<CustomizationDto>,
}

pub async fn get_meal(
    State(state): State<ServerState>,
    Path(meal_id): Path<u64>,
) -> ApiResult<MealBody> {
    let catalog = state.store.catalog();
    let meal = catalog
        .get_meal(meal_id)
        .map_err(|_| ApiError::MealDoesNotExist)?;
    if !meal.enabled {
        return Err(ApiError::MealDisabled {
            meal_name: meal.name,
        });
    }
    let customizations = catalog
        .customizations_for_meal(meal_id)
        .iter()
        .map(CustomizationDto::new)
        .collect();
    Ok(success(MealBody { customizations }))
}

// ---- ordering ----

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub meal_id: u64,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Vec<OrderItemCustomizationRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemCustomizationRequest {
    pub customization_id: u64,
    pub options: Vec<usize>,
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub restaurant_id: u64,
    pub table: i32,
    pub order_items: Vec<OrderItemRequest>,
    /// Absent or null means no tip at placement
    pub tip: Option<Decimal>,
    pub payment_method_id: String,
}

pub async fn place_order(
    State(state): State<ServerState>,
    ActiveCustomer { user, customer }: ActiveCustomer,
    Json(body): Json<PlaceOrderRequest>,
) -> ApiResult<PaymentOutcomeBody> {
    let input = PlaceOrderInput {
        restaurant_id: body.restaurant_id,
        table: body.table,
        items: body
            .order_items
            .into_iter()
            .map(|item| OrderLineInput {
                meal_id: item.meal_id,
                quantity: item.quantity,
                customizations: item
                    .customizations
                    .into_iter()
                    .map(|c| CustomizationInput {
                        customization_id: c.customization_id,
                        option_indices: c.options,
                    })
                    .collect(),
            })
            .collect(),
        tip: body.tip,
        payment_method_id: body.payment_method_id,
    };
    let outcome = state.orders().place_order(&user, customer.id, input).await?;
    Ok(success(outcome))
}

#[derive(Deserialize)]
pub struct AddTipRequest {
    pub order_id: u64,
    pub tip: Decimal,
}

pub async fn add_tip(
    State(state): State<ServerState>,
    ActiveCustomer { user, customer }: ActiveCustomer,
    Json(body): Json<AddTipRequest>,
) -> ApiResult<PaymentOutcomeBody> {
    let outcome = state
        .orders()
        .add_tip(&user, customer.id, body.order_id, body.tip)
        .await?;
    Ok(success(outcome))
}

#[derive(Deserialize)]
pub struct RetryPaymentRequest {
    pub payment_intent_id: String,
}

pub async fn retry_order_payment(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
    Json(body): Json<RetryPaymentRequest>,
) -> ApiResult<PaymentOutcomeBody> {
    let outcome = state
        .orders()
        .retry_order_payment(customer.id, &body.payment_intent_id)
        .await?;
    Ok(success(outcome))
}

pub async fn retry_tip_payment(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
    Json(body): Json<RetryPaymentRequest>,
) -> ApiResult<PaymentOutcomeBody> {
    let outcome = state
        .orders()
        .retry_tip_payment(customer.id, &body.payment_intent_id)
        .await?;
    Ok(success(outcome))
}

// ---- order history ----

#[derive(Serialize)]
pub struct OrdersBody {
    pub orders: Vec<OrderSummaryDto>,
}

pub async fn get_orders(
    State(state): State<ServerState>,
    ActiveCustomer { user, customer }: ActiveCustomer,
) -> ApiResult<OrdersBody> {
    let catalog = state.store.catalog();
    let orders = state
        .store
        .orders()
        .orders_for_customer(customer.id)
        .iter()
        .map(|order| {
            let restaurant_name = catalog
                .get_restaurant(order.restaurant_id)
                .map(|r| r.name)
                .unwrap_or_default();
            OrderSummaryDto::for_customer(order, &restaurant_name, user.name.as_deref())
        })
        .collect();
    Ok(success(OrdersBody { orders }))
}

#[derive(Serialize)]
pub struct OrderDetailsBody {
    pub order_details: OrderDetailsDto,
}

pub async fn get_order_details(
    State(state): State<ServerState>,
    ActiveCustomer { user, customer }: ActiveCustomer,
    Path(order_id): Path<u64>,
) -> ApiResult<OrderDetailsBody> {
    let orders = state.store.orders();
    let order = orders
        .get(order_id)
        .map_err(|_| ApiError::OrderDoesNotExist)?;
    if order.customer_id != Some(customer.id) {
        return Err(ApiError::OrderDoesNotExist);
    }
    let items = orders.items_for_order(order.id);
    Ok(success(OrderDetailsBody {
        order_details: OrderDetailsDto::for_customer(&order, user.name.as_deref(), &items),
    }))
}

// ---- service requests ----

#[derive(Deserialize)]
pub struct MakeRequestBody {
    pub request_option_id: u64,
    pub table: i32,
}

pub async fn make_request(
    State(state): State<ServerState>,
    ActiveCustomer { user, customer }: ActiveCustomer,
    Json(body): Json<MakeRequestBody>,
) -> ApiResult<Empty> {
    state
        .orders()
        .make_request(&user, customer.id, body.request_option_id, body.table)
        .await?;
    Ok(success_empty())
}

// ---- cards ----

#[derive(Serialize)]
pub struct SetupCardBody {
    pub client_secret: String,
}

pub async fn setup_card(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
) -> ApiResult<SetupCardBody> {
    let client_secret = state
        .gateway
        .create_setup_intent(&customer.gateway_customer_id)
        .await?;
    Ok(success(SetupCardBody { client_secret }))
}

#[derive(Deserialize)]
pub struct RemoveCardRequest {
    pub payment_method_id: String,
}

pub async fn remove_card(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
    Json(body): Json<RemoveCardRequest>,
) -> ApiResult<Empty> {
    let detached = state
        .gateway
        .detach_card(&customer.gateway_customer_id, &body.payment_method_id)
        .await?;
    if !detached {
        return Err(ApiError::InvalidStripeId);
    }
    Ok(success_empty())
}

#[derive(Serialize)]
pub struct CardsBody {
    pub cards: Vec<CardDto>,
}

pub async fn get_cards(
    State(state): State<ServerState>,
    ActiveCustomer { customer, .. }: ActiveCustomer,
) -> ApiResult<CardsBody> {
    let cards = state
        .gateway
        .list_cards(&customer.gateway_customer_id)
        .await?
        .iter()
        .map(CardDto::new)
        .collect();
    Ok(success(CardsBody { cards }))
}
