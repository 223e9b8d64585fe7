//! Order workflow tests against a mock gateway and a recording publisher

mod common;

use common::{ChargeBehavior, fixture};
use rust_decimal::Decimal;
use swick_server::db::models::{OrderItemStatus, OrderStatus};
use swick_server::orders::{CustomizationInput, OrderLineInput, PlaceOrderInput};
use swick_server::utils::ApiError;

fn simple_cart(f: &common::Fixture, tip: Option<Decimal>) -> PlaceOrderInput {
    PlaceOrderInput {
        restaurant_id: f.restaurant.id,
        table: 4,
        items: vec![
            OrderLineInput {
                meal_id: f.curry.id,
                quantity: 1,
                customizations: vec![],
            },
            OrderLineInput {
                meal_id: f.rice.id,
                quantity: 1,
                customizations: vec![],
            },
        ],
        tip,
        payment_method_id: "pm_mock".into(),
    }
}

#[tokio::test]
async fn successful_placement_activates_order() {
    let f = fixture();
    let service = f.state.orders();

    // 20.00 + 2.00 at 6% tax: 22.00 / 1.32 / 23.32
    let outcome = service
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "succeeded");
    assert!(outcome.payment_intent.is_some());

    let orders = f.state.store.orders().orders_for_customer(f.customer.id);
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderStatus::Active);
    assert_eq!(order.subtotal, Decimal::new(2200, 2));
    assert_eq!(order.tax, Decimal::new(132, 2));
    assert_eq!(order.total, Decimal::new(2332, 2));
    assert_eq!(order.fee, Some(Decimal::new(144, 2)));
    assert_eq!(order.payment_intent_id, outcome.payment_intent);

    // charged in cents on the restaurant's connected account
    let charge = f.gateway.last_charge();
    assert_eq!(charge.amount_cents, 2332);
    assert_eq!(charge.gateway_account_id, "acct_test");

    // customer and restaurant both hear about it
    let placed = f.publisher.events_named("order-placed");
    assert_eq!(placed.len(), 2);
    assert!(placed.iter().any(|e| e.channels
        == vec![format!("private-customer-{}", f.customer.id)]));
    let to_kitchen = placed
        .iter()
        .find(|e| e.channels == vec![format!("private-restaurant-{}", f.restaurant.id)])
        .unwrap();
    assert_eq!(to_kitchen.payload["order_items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn declined_card_deletes_the_order() {
    let f = fixture();
    f.gateway
        .set_behavior(ChargeBehavior::DeclineCard("Your card was declined".into()));

    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "card_error");
    assert_eq!(outcome.error.as_deref(), Some("Your card was declined"));

    // nothing left behind, nothing announced
    assert!(f.state.store.orders().orders_for_customer(f.customer.id).is_empty());
    assert!(f.publisher.events_named("order-placed").is_empty());
}

#[tokio::test]
async fn requires_payment_method_at_placement_deletes_the_order() {
    let f = fixture();
    f.gateway.set_behavior(ChargeBehavior::RequirePaymentMethod(Some(
        "Your card has insufficient funds".into(),
    )));

    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "requires_payment_method");
    assert_eq!(
        outcome.error.as_deref(),
        Some("Your card has insufficient funds")
    );
    assert!(outcome.payment_intent.is_some());

    // the order created for the charge is gone again
    let order_id = f.gateway.last_charge().order_id;
    assert!(f.state.store.orders().get(order_id).is_err());
    assert!(f.publisher.events_named("order-placed").is_empty());
}

#[tokio::test]
async fn provider_fault_keeps_the_order_processing() {
    let f = fixture();
    f.gateway
        .set_behavior(ChargeBehavior::Fail("connection reset by peer".into()));

    let err = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::StripeApiError));

    // a provider fault is not a decline: the order survives in PROCESSING,
    // hidden from history
    let order_id = f.gateway.last_charge().order_id;
    let order = f.state.store.orders().get(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(f.state.store.orders().orders_for_customer(f.customer.id).is_empty());
    assert!(f.publisher.events_named("order-placed").is_empty());
}

#[tokio::test]
async fn below_minimum_cart_is_rejected_before_charging() {
    let f = fixture();
    let input = PlaceOrderInput {
        restaurant_id: f.restaurant.id,
        table: 4,
        items: vec![OrderLineInput {
            meal_id: f.rice.id,
            quantity: 1,
            customizations: vec![],
        }],
        tip: None,
        payment_method_id: "pm_mock".into(),
    };

    // 2.00 + 0.12 tax = 2.12, chargeable; drop to a 0.25 meal instead
    let catalog = f.state.store.catalog();
    let tax = catalog.default_tax_category(f.restaurant.id).unwrap();
    let cheap = catalog.create_meal(
        f.curry.category_id,
        "Mint",
        "",
        Decimal::new(25, 2),
        tax.id,
    );
    let input = PlaceOrderInput {
        items: vec![OrderLineInput {
            meal_id: cheap.id,
            quantity: 1,
            customizations: vec![],
        }],
        ..input
    };

    let err = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, input)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidChargeAmount));
    assert_eq!(f.gateway.charge_count(), 0);
    assert!(f.state.store.orders().orders_for_customer(f.customer.id).is_empty());
}

#[tokio::test]
async fn disabled_meal_rejects_the_cart() {
    let f = fixture();
    f.state
        .store
        .catalog()
        .set_meal_enabled(f.rice.id, false)
        .unwrap();

    let err = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MealDisabled { meal_name } if meal_name == "Rice"));
    assert_eq!(f.gateway.charge_count(), 0);
}

#[tokio::test]
async fn out_of_range_option_index_is_invalid_request() {
    let f = fixture();
    let group = f
        .state
        .store
        .catalog()
        .create_customization(swick_server::db::models::Customization {
            id: 0,
            meal_id: f.curry.id,
            name: "Spice".into(),
            options: vec!["Mild".into(), "Hot".into()],
            price_additions: vec![Decimal::ZERO, Decimal::ZERO],
            min: 0,
            max: 1,
        })
        .unwrap();

    let input = PlaceOrderInput {
        restaurant_id: f.restaurant.id,
        table: 4,
        items: vec![OrderLineInput {
            meal_id: f.curry.id,
            quantity: 1,
            customizations: vec![CustomizationInput {
                customization_id: group.id,
                option_indices: vec![9],
            }],
        }],
        tip: None,
        payment_method_id: "pm_mock".into(),
    };
    let err = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, input)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest));
}

#[tokio::test]
async fn requires_action_keeps_order_processing_until_retry() {
    let f = fixture();
    f.gateway.set_behavior(ChargeBehavior::RequireAction);

    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "requires_action");
    let intent_id = outcome.payment_intent.unwrap();
    assert!(outcome.client_secret.is_some());

    // hidden from history while processing, but intent is pinned to it
    assert!(f.state.store.orders().orders_for_customer(f.customer.id).is_empty());

    // client finished 3DS, retry succeeds
    f.gateway.set_behavior(ChargeBehavior::Succeed);
    let retried = f
        .state
        .orders()
        .retry_order_payment(f.customer.id, &intent_id)
        .await
        .unwrap();
    assert_eq!(retried.intent_status, "succeeded");

    let orders = f.state.store.orders().orders_for_customer(f.customer.id);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Active);
    assert_eq!(retried.order_id, Some(orders[0].id));
    assert_eq!(f.publisher.events_named("order-placed").len(), 2);
}

#[tokio::test]
async fn retry_with_foreign_intent_is_refused_without_side_effects() {
    let f = fixture();
    f.gateway.set_behavior(ChargeBehavior::RequireAction);
    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let intent_id = outcome.payment_intent.unwrap();

    let err = f
        .state
        .orders()
        .retry_order_payment(f.customer.id, "pi_someone_elses")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStripeId));

    // the pending order is untouched
    let pending = f
        .state
        .store
        .orders()
        .find_by_intent(f.customer.id, &intent_id, false)
        .unwrap();
    assert_eq!(pending.status, OrderStatus::Processing);
}

#[tokio::test]
async fn declined_retry_deletes_the_pending_order() {
    let f = fixture();
    f.gateway.set_behavior(ChargeBehavior::RequireAction);
    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let intent_id = outcome.payment_intent.unwrap();

    f.gateway
        .set_behavior(ChargeBehavior::DeclineCard("Authentication failed".into()));
    let retried = f
        .state
        .orders()
        .retry_order_payment(f.customer.id, &intent_id)
        .await
        .unwrap();
    assert_eq!(retried.intent_status, "card_error");

    // retrying the same intent again no longer resolves to an order
    let err = f
        .state
        .orders()
        .retry_order_payment(f.customer.id, &intent_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStripeId));
}

#[tokio::test]
async fn tip_accumulates_onto_total_and_fee() {
    let f = fixture();
    let service = f.state.orders();
    service
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let order_id = f.state.store.orders().orders_for_customer(f.customer.id)[0].id;

    f.gateway.set_fee(Some(Decimal::new(36, 2)));
    let outcome = service
        .add_tip(&f.user, f.customer.id, order_id, Decimal::new(200, 2))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "succeeded");

    let order = f.state.store.orders().get(order_id).unwrap();
    assert_eq!(order.tip, Some(Decimal::new(200, 2)));
    // 23.32 + 2.00
    assert_eq!(order.total, Decimal::new(2532, 2));
    // 1.44 placement fee + 0.36 tip fee
    assert_eq!(order.fee, Some(Decimal::new(180, 2)));
    assert!(order.tip_payment_intent_id.is_some());

    // tip charge reuses the order's payment method on the connected account
    let charge = f.gateway.last_charge();
    assert_eq!(charge.amount_cents, 200);
    assert!(charge.customer_gateway_id.is_none());
    assert_eq!(charge.payment_method_id, "pm_mock");

    let events = f.publisher.events_named(&format!("tip-added-order-{order_id}"));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["updated_total"], "25.32");

    // a second tip stacks
    let outcome = service
        .add_tip(&f.user, f.customer.id, order_id, Decimal::new(100, 2))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "succeeded");
    let order = f.state.store.orders().get(order_id).unwrap();
    assert_eq!(order.tip, Some(Decimal::new(300, 2)));
    assert_eq!(order.total, Decimal::new(2632, 2));
}

#[tokio::test]
async fn tip_on_foreign_order_is_refused() {
    let f = fixture();
    f.state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let order_id = f.state.store.orders().orders_for_customer(f.customer.id)[0].id;

    let accounts = f.state.store.accounts();
    let other_user = accounts.create_user("bob@example.com", Some("Bob"));
    let other = accounts.create_customer(other_user.id, "cus_bob");

    let err = f
        .state
        .orders()
        .add_tip(&other_user, other.id, order_id, Decimal::new(200, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest));
}

#[tokio::test]
async fn tip_after_card_removal_reports_card_gone() {
    let f = fixture();
    f.state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let order_id = f.state.store.orders().orders_for_customer(f.customer.id)[0].id;

    *f.gateway.card_detached.lock().unwrap() = true;
    let outcome = f
        .state
        .orders()
        .add_tip(&f.user, f.customer.id, order_id, Decimal::new(200, 2))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "card_error");
    assert_eq!(
        outcome.error.as_deref(),
        Some("Card used for this order no longer exists")
    );
    // no tip recorded
    assert_eq!(f.state.store.orders().get(order_id).unwrap().tip, None);
}

#[tokio::test]
async fn item_completion_drives_order_status() {
    let f = fixture();
    let service = f.state.orders();
    service
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let orders = f.state.store.orders();
    let order_id = orders.orders_for_customer(f.customer.id)[0].id;
    let items = orders.items_for_order(order_id);
    assert_eq!(items.len(), 2);

    service
        .update_item_status(f.restaurant.id, items[0].id, OrderItemStatus::Complete)
        .await
        .unwrap();
    assert_eq!(orders.get(order_id).unwrap().status, OrderStatus::Active);

    service
        .update_item_status(f.restaurant.id, items[1].id, OrderItemStatus::Complete)
        .await
        .unwrap();
    assert_eq!(orders.get(order_id).unwrap().status, OrderStatus::Complete);

    // sending a completed item back reopens the order
    service
        .update_item_status(f.restaurant.id, items[0].id, OrderItemStatus::Sending)
        .await
        .unwrap();
    assert_eq!(orders.get(order_id).unwrap().status, OrderStatus::Active);

    let status_events = f.publisher.events_named("order-status-updated");
    assert_eq!(status_events.len(), 2);
    assert_eq!(status_events[0].payload["new_status"], "Complete");
    assert_eq!(status_events[1].payload["new_status"], "Active");
    assert_eq!(f.publisher.events_named("item-status-updated").len(), 3);
}

#[tokio::test]
async fn staff_cannot_touch_other_restaurants_items() {
    let f = fixture();
    f.state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    let orders = f.state.store.orders();
    let order_id = orders.orders_for_customer(f.customer.id)[0].id;
    let item_id = orders.items_for_order(order_id)[0].id;

    let other = f
        .state
        .store
        .catalog()
        .create_restaurant("Other Place", "2 Side St", "America/Detroit", "acct_other");
    let err = f
        .state
        .orders()
        .update_item_status(other.id, item_id, OrderItemStatus::Complete)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest));
}

#[tokio::test]
async fn duplicate_request_is_rejected() {
    let f = fixture();
    let option = f.state.store.requests().create_option(f.restaurant.id, "Water");
    let service = f.state.orders();

    service
        .make_request(&f.user, f.customer.id, option.id, 4)
        .await
        .unwrap();
    let err = service
        .make_request(&f.user, f.customer.id, option.id, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RequestInProgress));

    let made = f.publisher.events_named("request-made");
    assert_eq!(made.len(), 1);
    assert_eq!(made[0].payload["request"]["request_name"], "Water");

    // staff clears it, then the customer can ask again
    let request_id = made[0].payload["request"]["id"].as_u64().unwrap();
    service
        .delete_request(f.restaurant.id, request_id)
        .await
        .unwrap();
    assert_eq!(f.publisher.events_named("request-deleted").len(), 1);
    service
        .make_request(&f.user, f.customer.id, option.id, 4)
        .await
        .unwrap();
}

#[tokio::test]
async fn fee_lookup_failure_still_activates_the_order() {
    let f = fixture();
    f.gateway.set_fee(None);

    let outcome = f
        .state
        .orders()
        .place_order(&f.user, f.customer.id, simple_cart(&f, None))
        .await
        .unwrap();
    assert_eq!(outcome.intent_status, "succeeded");

    let order = &f.state.store.orders().orders_for_customer(f.customer.id)[0];
    assert_eq!(order.status, OrderStatus::Active);
    assert_eq!(order.fee, None);
}
