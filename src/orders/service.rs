//! Order workflow service
//!
//! Placement, tipping, payment retries, and the kitchen state machine. The
//! repositories record state, the pricing module does the arithmetic, the
//! gateway moves the money, and the notifier tells everyone about it.
//!
//! Charge outcomes map to order state as follows:
//!
//! ```text
//! succeeded               -> ACTIVE, intent id and fee recorded
//! requires_action         -> stays PROCESSING, client finishes 3DS
//! requires_payment_method -> order deleted (placement) / no change (tip)
//! card_error              -> order deleted (placement) / no change (tip)
//! provider fault          -> stays PROCESSING, stripe_api_error
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::dto::{OrderItemToCookDto, OrderSummaryDto, RequestDto};
use crate::db::Store;
use crate::db::models::{NewOrderItem, Order, OrderItemStatus, OrderStatus, User};
use crate::notify::Notifier;
use crate::payment::{
    ChargeOutcome, ChargeRequest, ConfirmOutcome, GatewayError, PaymentGateway, ensure_chargeable,
};
use crate::pricing::{CartLine, CartSelection, PricedCart, PricingError, price_cart, round_money};
use crate::utils::ApiError;

const CARD_GONE_MESSAGE: &str = "Card used for this order no longer exists";

/// Payment outcome fields shared by placement, tipping, and both retries
#[derive(Debug, Serialize)]
pub struct PaymentOutcomeBody {
    pub intent_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
}

impl PaymentOutcomeBody {
    fn new(intent_status: &'static str) -> Self {
        Self {
            intent_status,
            error: None,
            payment_intent: None,
            client_secret: None,
            order_id: None,
        }
    }
}

#[derive(Debug)]
pub struct CustomizationInput {
    pub customization_id: u64,
    pub option_indices: Vec<usize>,
}

#[derive(Debug)]
pub struct OrderLineInput {
    pub meal_id: u64,
    pub quantity: u32,
    pub customizations: Vec<CustomizationInput>,
}

#[derive(Debug)]
pub struct PlaceOrderInput {
    pub restaurant_id: u64,
    pub table: i32,
    pub items: Vec<OrderLineInput>,
    pub tip: Option<Decimal>,
    pub payment_method_id: String,
}

#[derive(Clone)]
pub struct OrderService {
    store: Store,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier,
}

fn to_cents(amount: Decimal) -> Result<i64, ApiError> {
    (amount * Decimal::from(100))
        .to_i64()
        .ok_or(ApiError::InvalidRequest)
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::AmountBelowMinimum(_) => ApiError::InvalidChargeAmount,
            GatewayError::Api(message) => {
                warn!(error = %message, "Payment provider call failed");
                ApiError::StripeApiError
            }
        }
    }
}

impl OrderService {
    pub fn new(store: Store, gateway: Arc<dyn PaymentGateway>, notifier: Notifier) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    fn customer_name(&self, order: &Order) -> Option<String> {
        let customer_id = order.customer_id?;
        let accounts = self.store.accounts();
        let customer = accounts.get_customer(customer_id).ok()?;
        accounts.get_user(customer.user_id).ok()?.name
    }

    /// Fee lookup is best effort: a failure is logged and the fee stays unset
    async fn fee_for_intent(&self, gateway_account_id: &str, intent_id: &str) -> Option<Decimal> {
        match self.gateway.processing_fee(gateway_account_id, intent_id).await {
            Ok(fee) => fee,
            Err(e) => {
                warn!(intent_id, error = %e, "Fee lookup failed");
                None
            }
        }
    }

    /// Remove the order a declined charge leaves behind; a failed cleanup is
    /// logged, not surfaced
    fn discard_declined_order(&self, order_id: u64) {
        if let Err(e) = self.store.orders().delete(order_id) {
            warn!(order_id, error = %e, "Declined order cleanup failed");
        }
    }

    async fn announce_order_placed(&self, order: &Order) {
        let Ok(restaurant) = self.store.catalog().get_restaurant(order.restaurant_id) else {
            return;
        };
        let customer_name = self.customer_name(order);
        let summary =
            OrderSummaryDto::for_customer(order, &restaurant.name, customer_name.as_deref());
        let items_to_cook: Vec<OrderItemToCookDto> = self
            .store
            .orders()
            .items_for_order(order.id)
            .iter()
            .map(OrderItemToCookDto::new)
            .collect();
        self.notifier
            .order_placed(order, &summary, &items_to_cook)
            .await;
    }

    /// Price the cart, charge the saved card, and create the order.
    ///
    /// The charge amount is validated before anything is written, so a
    /// below-minimum cart never leaves an orphan order behind.
    pub async fn place_order(
        &self,
        user: &User,
        customer_id: u64,
        input: PlaceOrderInput,
    ) -> Result<PaymentOutcomeBody, ApiError> {
        let catalog = self.store.catalog();
        let restaurant = catalog
            .get_restaurant(input.restaurant_id)
            .map_err(|_| ApiError::RestaurantDoesNotExist)?;

        // load menu rows up front; CartLine borrows them
        let mut loaded = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let meal = catalog
                .get_meal(line.meal_id)
                .map_err(|_| ApiError::MealDoesNotExist)?;
            let category = catalog
                .get_category(meal.category_id)
                .map_err(|_| ApiError::InvalidRequest)?;
            if category.restaurant_id != restaurant.id {
                return Err(ApiError::InvalidRequest);
            }
            let tax_rate = catalog
                .tax_rate_for_meal(&meal)
                .map_err(|_| ApiError::InvalidRequest)?;
            let mut groups = Vec::with_capacity(line.customizations.len());
            for selection in &line.customizations {
                let group = catalog
                    .get_customization(selection.customization_id)
                    .map_err(|_| ApiError::InvalidRequest)?;
                if group.meal_id != meal.id {
                    return Err(ApiError::InvalidRequest);
                }
                groups.push(group);
            }
            loaded.push((meal, tax_rate, groups));
        }

        let lines: Vec<CartLine> = loaded
            .iter()
            .zip(&input.items)
            .map(|((meal, tax_rate, groups), line)| CartLine {
                meal,
                tax_rate: *tax_rate,
                quantity: line.quantity,
                selections: groups
                    .iter()
                    .zip(&line.customizations)
                    .map(|(group, sel)| CartSelection {
                        customization: group,
                        option_indices: sel.option_indices.clone(),
                    })
                    .collect(),
            })
            .collect();

        let cart = price_cart(&lines, input.tip).map_err(|e| match e {
            PricingError::MealDisabled { meal_name } => ApiError::MealDisabled { meal_name },
            PricingError::OptionIndexOutOfRange | PricingError::ZeroQuantity => {
                ApiError::InvalidRequest
            }
        })?;

        let amount_cents = to_cents(cart.total)?;
        ensure_chargeable(amount_cents)?;

        let order = self.create_processing_order(restaurant.id, customer_id, input.table, &cart);

        let customer = self
            .store
            .accounts()
            .get_customer(customer_id)
            .map_err(|_| ApiError::InvalidRequest)?;
        let outcome = self
            .gateway
            .charge(&ChargeRequest {
                gateway_account_id: restaurant.gateway_account_id.clone(),
                customer_gateway_id: Some(customer.gateway_customer_id.clone()),
                receipt_email: user.email.clone(),
                payment_method_id: input.payment_method_id.clone(),
                amount_cents,
                order_id: order.id,
            })
            .await?;

        let orders = self.store.orders();
        match outcome {
            ChargeOutcome::CardError { error } => {
                self.discard_declined_order(order.id);
                Ok(PaymentOutcomeBody {
                    error: Some(error),
                    ..PaymentOutcomeBody::new("card_error")
                })
            }
            ChargeOutcome::RequiresPaymentMethod { intent_id, error } => {
                self.discard_declined_order(order.id);
                Ok(PaymentOutcomeBody {
                    error,
                    payment_intent: Some(intent_id),
                    ..PaymentOutcomeBody::new("requires_payment_method")
                })
            }
            ChargeOutcome::RequiresAction {
                intent_id,
                client_secret,
            } => {
                orders
                    .set_payment_intent(order.id, &intent_id)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                Ok(PaymentOutcomeBody {
                    payment_intent: Some(intent_id),
                    client_secret: Some(client_secret),
                    ..PaymentOutcomeBody::new("requires_action")
                })
            }
            ChargeOutcome::Succeeded { intent_id } => {
                orders
                    .set_payment_intent(order.id, &intent_id)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                let fee = self
                    .fee_for_intent(&restaurant.gateway_account_id, &intent_id)
                    .await;
                let order = orders
                    .mark_active(order.id, fee)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                info!(order_id = order.id, "Order placed");
                self.announce_order_placed(&order).await;
                Ok(PaymentOutcomeBody {
                    payment_intent: Some(intent_id),
                    ..PaymentOutcomeBody::new("succeeded")
                })
            }
            ChargeOutcome::Unhandled => Err(ApiError::UnhandledStatus),
        }
    }

    fn create_processing_order(
        &self,
        restaurant_id: u64,
        customer_id: u64,
        table: i32,
        cart: &PricedCart,
    ) -> Order {
        let items = cart
            .items
            .iter()
            .map(|item| NewOrderItem {
                meal_name: item.meal_name.clone(),
                meal_price: item.meal_price,
                quantity: item.quantity,
                total: item.total,
                customizations: item.customizations.clone(),
            })
            .collect();
        self.store.orders().create(
            restaurant_id,
            customer_id,
            table,
            cart.subtotal,
            cart.tax,
            cart.tip,
            cart.total,
            items,
        )
    }

    /// Charge a tip onto an existing order, reusing the card the order was
    /// paid with
    pub async fn add_tip(
        &self,
        user: &User,
        customer_id: u64,
        order_id: u64,
        tip: Decimal,
    ) -> Result<PaymentOutcomeBody, ApiError> {
        let orders = self.store.orders();
        let order = orders.get(order_id).map_err(|_| ApiError::OrderDoesNotExist)?;
        if order.customer_id != Some(customer_id) {
            return Err(ApiError::InvalidRequest);
        }

        let tip = round_money(tip);
        if tip <= Decimal::ZERO {
            return Err(ApiError::InvalidRequest);
        }
        let amount_cents = to_cents(tip)?;
        ensure_chargeable(amount_cents)?;

        let restaurant = self
            .store
            .catalog()
            .get_restaurant(order.restaurant_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        let intent_id = order
            .payment_intent_id
            .as_deref()
            .ok_or(ApiError::InvalidRequest)?;

        let card = self
            .gateway
            .intent_payment_method(&restaurant.gateway_account_id, intent_id)
            .await?;
        let Some(payment_method_id) = card.payment_method_id else {
            return Ok(PaymentOutcomeBody {
                error: Some(CARD_GONE_MESSAGE.to_string()),
                ..PaymentOutcomeBody::new("card_error")
            });
        };

        let outcome = self
            .gateway
            .charge(&ChargeRequest {
                gateway_account_id: restaurant.gateway_account_id.clone(),
                // method already lives on the connected account
                customer_gateway_id: None,
                receipt_email: user.email.clone(),
                payment_method_id,
                amount_cents,
                order_id: order.id,
            })
            .await?;

        match outcome {
            ChargeOutcome::CardError { error } => Ok(PaymentOutcomeBody {
                error: Some(error),
                ..PaymentOutcomeBody::new("card_error")
            }),
            ChargeOutcome::RequiresPaymentMethod { intent_id, error } => Ok(PaymentOutcomeBody {
                error,
                payment_intent: Some(intent_id),
                ..PaymentOutcomeBody::new("requires_payment_method")
            }),
            ChargeOutcome::RequiresAction {
                intent_id,
                client_secret,
            } => {
                orders
                    .set_tip_payment_intent(order.id, &intent_id)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                Ok(PaymentOutcomeBody {
                    payment_intent: Some(intent_id),
                    client_secret: Some(client_secret),
                    ..PaymentOutcomeBody::new("requires_action")
                })
            }
            ChargeOutcome::Succeeded { intent_id } => {
                orders
                    .set_tip_payment_intent(order.id, &intent_id)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                let fee = self
                    .fee_for_intent(&restaurant.gateway_account_id, &intent_id)
                    .await;
                let order = orders
                    .apply_tip(order.id, tip, fee)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                info!(order_id = order.id, %tip, "Tip added");
                self.notifier.tip_added(&order).await;
                Ok(PaymentOutcomeBody {
                    payment_intent: Some(intent_id),
                    ..PaymentOutcomeBody::new("succeeded")
                })
            }
            ChargeOutcome::Unhandled => Err(ApiError::UnhandledStatus),
        }
    }

    /// The customer's order holding this placement intent, or the uniform
    /// ownership error
    fn owned_order_for_intent(
        &self,
        customer_id: u64,
        intent_id: &str,
        tip_intent: bool,
    ) -> Result<Order, ApiError> {
        self.store
            .orders()
            .find_by_intent(customer_id, intent_id, tip_intent)
            .ok_or(ApiError::InvalidStripeId)
    }

    /// Re-confirm a placement intent after client-side authentication
    pub async fn retry_order_payment(
        &self,
        customer_id: u64,
        intent_id: &str,
    ) -> Result<PaymentOutcomeBody, ApiError> {
        let order = self.owned_order_for_intent(customer_id, intent_id, false)?;
        let restaurant = self
            .store
            .catalog()
            .get_restaurant(order.restaurant_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let outcome = self
            .gateway
            .confirm_retry(&restaurant.gateway_account_id, intent_id, order.id)
            .await?;

        let orders = self.store.orders();
        match outcome {
            ConfirmOutcome::NotOwned => Err(ApiError::InvalidStripeId),
            ConfirmOutcome::CardError { error } => {
                self.discard_declined_order(order.id);
                Ok(PaymentOutcomeBody {
                    error: Some(error),
                    order_id: Some(order.id),
                    ..PaymentOutcomeBody::new("card_error")
                })
            }
            ConfirmOutcome::RequiresPaymentMethod { error } => {
                self.discard_declined_order(order.id);
                Ok(PaymentOutcomeBody {
                    error,
                    order_id: Some(order.id),
                    ..PaymentOutcomeBody::new("requires_payment_method")
                })
            }
            ConfirmOutcome::Succeeded { .. } => {
                let fee = self
                    .fee_for_intent(&restaurant.gateway_account_id, intent_id)
                    .await;
                let order = orders
                    .mark_active(order.id, fee)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                info!(order_id = order.id, "Order payment retry succeeded");
                self.announce_order_placed(&order).await;
                Ok(PaymentOutcomeBody {
                    order_id: Some(order.id),
                    ..PaymentOutcomeBody::new("succeeded")
                })
            }
            ConfirmOutcome::Unhandled => Err(ApiError::UnhandledStatus),
        }
    }

    /// Re-confirm a tip intent after client-side authentication
    pub async fn retry_tip_payment(
        &self,
        customer_id: u64,
        intent_id: &str,
    ) -> Result<PaymentOutcomeBody, ApiError> {
        let order = self.owned_order_for_intent(customer_id, intent_id, true)?;
        let restaurant = self
            .store
            .catalog()
            .get_restaurant(order.restaurant_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let outcome = self
            .gateway
            .confirm_retry(&restaurant.gateway_account_id, intent_id, order.id)
            .await?;

        match outcome {
            ConfirmOutcome::NotOwned => Err(ApiError::InvalidStripeId),
            ConfirmOutcome::CardError { error } => Ok(PaymentOutcomeBody {
                error: Some(error),
                order_id: Some(order.id),
                ..PaymentOutcomeBody::new("card_error")
            }),
            ConfirmOutcome::RequiresPaymentMethod { error } => Ok(PaymentOutcomeBody {
                error,
                order_id: Some(order.id),
                ..PaymentOutcomeBody::new("requires_payment_method")
            }),
            ConfirmOutcome::Succeeded { amount_cents } => {
                let fee = self
                    .fee_for_intent(&restaurant.gateway_account_id, intent_id)
                    .await;
                let tip = Decimal::new(amount_cents, 2);
                let order = self
                    .store
                    .orders()
                    .apply_tip(order.id, tip, fee)
                    .map_err(|e| ApiError::internal(e.to_string()))?;
                self.notifier.tip_added(&order).await;
                Ok(PaymentOutcomeBody {
                    order_id: Some(order.id),
                    ..PaymentOutcomeBody::new("succeeded")
                })
            }
            ConfirmOutcome::Unhandled => Err(ApiError::UnhandledStatus),
        }
    }

    /// Move an item through the kitchen and recompute the order's status
    /// from its items. Both updates are announced.
    pub async fn update_item_status(
        &self,
        staff_restaurant_id: u64,
        item_id: u64,
        status: OrderItemStatus,
    ) -> Result<(), ApiError> {
        let orders = self.store.orders();
        let item = orders.get_item(item_id).map_err(|_| ApiError::InvalidRequest)?;
        let order = orders
            .get(item.order_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        if order.restaurant_id != staff_restaurant_id {
            return Err(ApiError::InvalidRequest);
        }

        let item = orders
            .set_item_status(item_id, status)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let new_order_status = if orders.all_items_complete(order.id) {
            OrderStatus::Complete
        } else {
            OrderStatus::Active
        };
        let order = if new_order_status != order.status {
            let order = orders
                .set_status(order.id, new_order_status)
                .map_err(|e| ApiError::internal(e.to_string()))?;
            self.notifier.order_status_updated(&order).await;
            order
        } else {
            order
        };

        let customer_name = self.customer_name(&order);
        self.notifier
            .item_status_updated(&order, &item, customer_name.as_deref())
            .await;
        Ok(())
    }

    /// Open a table service request for the customer
    pub async fn make_request(
        &self,
        user: &User,
        customer_id: u64,
        option_id: u64,
        table: i32,
    ) -> Result<(), ApiError> {
        let requests = self.store.requests();
        let option = requests
            .get_option(option_id)
            .map_err(|_| ApiError::RequestOptionDoesNotExist)?;
        if requests.duplicate_exists(customer_id, option_id) {
            return Err(ApiError::RequestInProgress);
        }
        let request = requests.create(customer_id, option_id, table);
        let dto = RequestDto::new(&request, &option.name, user.name.as_deref());
        self.notifier
            .request_made(customer_id, option.restaurant_id, &dto)
            .await;
        Ok(())
    }

    /// Staff handled a request; remove it and tell the dashboard
    pub async fn delete_request(
        &self,
        staff_restaurant_id: u64,
        request_id: u64,
    ) -> Result<(), ApiError> {
        let requests = self.store.requests();
        let request = requests
            .get(request_id)
            .map_err(|_| ApiError::InvalidRequest)?;
        let option = requests
            .get_option(request.request_option_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        if option.restaurant_id != staff_restaurant_id {
            return Err(ApiError::InvalidRequest);
        }
        requests
            .delete(request_id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        self.notifier
            .request_deleted(option.restaurant_id, request_id)
            .await;
        Ok(())
    }
}
