//! Shared test fixtures: mock payment gateway, recording publisher, and a
//! seeded store

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use swick_server::core::Config;
use swick_server::db::Store;
use swick_server::db::models::{Customer, Meal, Restaurant, User};
use swick_server::notify::{Channel, EventPublisher, NotifyError};
use swick_server::payment::{
    CardSummary, ChargeOutcome, ChargeRequest, ConfirmOutcome, GatewayError, IntentCard,
    PaymentGateway,
};
use swick_server::ServerState;

#[derive(Debug, Clone)]
pub enum ChargeBehavior {
    Succeed,
    RequireAction,
    DeclineCard(String),
    RequirePaymentMethod(Option<String>),
    Fail(String),
}

pub struct MockGateway {
    pub behavior: Mutex<ChargeBehavior>,
    pub fee: Mutex<Option<Decimal>>,
    pub charges: Mutex<Vec<ChargeRequest>>,
    /// intent id -> (order id, amount in cents)
    pub intents: Mutex<HashMap<String, (u64, i64)>>,
    pub card_detached: Mutex<bool>,
    seq: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(ChargeBehavior::Succeed),
            fee: Mutex::new(Some(Decimal::new(144, 2))),
            charges: Mutex::new(Vec::new()),
            intents: Mutex::new(HashMap::new()),
            card_detached: Mutex::new(false),
            seq: AtomicU64::new(1),
        }
    }

    pub fn set_behavior(&self, behavior: ChargeBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_fee(&self, fee: Option<Decimal>) {
        *self.fee.lock().unwrap() = fee;
    }

    pub fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }

    pub fn last_charge(&self) -> ChargeRequest {
        self.charges.lock().unwrap().last().cloned().unwrap()
    }

    fn next_intent(&self, order_id: u64, amount_cents: i64) -> String {
        let id = format!("pi_{}", self.seq.fetch_add(1, Ordering::Relaxed));
        self.intents
            .lock()
            .unwrap()
            .insert(id.clone(), (order_id, amount_cents));
        id
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_customer(&self, email: &str) -> Result<String, GatewayError> {
        Ok(format!("cus_{email}"))
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        self.charges.lock().unwrap().push(request.clone());
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ChargeBehavior::Succeed => Ok(ChargeOutcome::Succeeded {
                intent_id: self.next_intent(request.order_id, request.amount_cents),
            }),
            ChargeBehavior::RequireAction => {
                let intent_id = self.next_intent(request.order_id, request.amount_cents);
                Ok(ChargeOutcome::RequiresAction {
                    client_secret: format!("{intent_id}_secret"),
                    intent_id,
                })
            }
            ChargeBehavior::DeclineCard(error) => Ok(ChargeOutcome::CardError { error }),
            ChargeBehavior::RequirePaymentMethod(error) => {
                Ok(ChargeOutcome::RequiresPaymentMethod {
                    intent_id: self.next_intent(request.order_id, request.amount_cents),
                    error,
                })
            }
            ChargeBehavior::Fail(message) => Err(GatewayError::Api(message)),
        }
    }

    async fn confirm_retry(
        &self,
        _gateway_account_id: &str,
        intent_id: &str,
        expected_order_id: u64,
    ) -> Result<ConfirmOutcome, GatewayError> {
        let intents = self.intents.lock().unwrap();
        let Some(&(order_id, amount_cents)) = intents.get(intent_id) else {
            return Ok(ConfirmOutcome::NotOwned);
        };
        if order_id != expected_order_id {
            return Ok(ConfirmOutcome::NotOwned);
        }
        drop(intents);
        match self.behavior.lock().unwrap().clone() {
            ChargeBehavior::DeclineCard(error) => Ok(ConfirmOutcome::CardError { error }),
            ChargeBehavior::RequirePaymentMethod(error) => {
                Ok(ConfirmOutcome::RequiresPaymentMethod { error })
            }
            _ => Ok(ConfirmOutcome::Succeeded { amount_cents }),
        }
    }

    async fn intent_payment_method(
        &self,
        _gateway_account_id: &str,
        _intent_id: &str,
    ) -> Result<IntentCard, GatewayError> {
        let detached = *self.card_detached.lock().unwrap();
        Ok(IntentCard {
            payment_method_id: (!detached).then(|| "pm_mock".to_string()),
        })
    }

    async fn processing_fee(
        &self,
        _gateway_account_id: &str,
        _intent_id: &str,
    ) -> Result<Option<Decimal>, GatewayError> {
        Ok(*self.fee.lock().unwrap())
    }

    async fn create_setup_intent(&self, _customer: &str) -> Result<String, GatewayError> {
        Ok("seti_secret".to_string())
    }

    async fn list_cards(&self, _customer: &str) -> Result<Vec<CardSummary>, GatewayError> {
        Ok(vec![CardSummary {
            payment_method_id: "pm_mock".into(),
            brand: "visa".into(),
            last4: "4242".into(),
            exp_month: 12,
            exp_year: 2030,
        }])
    }

    async fn detach_card(
        &self,
        _customer: &str,
        payment_method_id: &str,
    ) -> Result<bool, GatewayError> {
        Ok(payment_method_id == "pm_mock")
    }
}

#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub channels: Vec<String>,
    pub event: String,
    pub payload: Value,
}

pub struct RecordingPublisher {
    pub events: Mutex<Vec<PublishedEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events_named(&self, event: &str) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        channels: &[Channel],
        event: &str,
        payload: Value,
    ) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(PublishedEvent {
            channels: channels.iter().map(Channel::name).collect(),
            event: event.to_string(),
            payload,
        });
        Ok(())
    }

    fn subscription_token(&self, socket_id: &str, channel: &Channel) -> String {
        format!("testkey:{socket_id}:{}", channel.name())
    }
}

pub struct Fixture {
    pub state: ServerState,
    pub gateway: std::sync::Arc<MockGateway>,
    pub publisher: std::sync::Arc<RecordingPublisher>,
    pub restaurant: Restaurant,
    pub user: User,
    pub customer: Customer,
    /// 20.00 entree taxed at 6%
    pub curry: Meal,
    /// 2.00 side taxed at 6%
    pub rice: Meal,
}

/// One restaurant with two meals at 6% tax, one customer with a saved card
pub fn fixture() -> Fixture {
    let store = Store::new();
    let gateway = std::sync::Arc::new(MockGateway::new());
    let publisher = std::sync::Arc::new(RecordingPublisher::new());
    let state = ServerState::with_parts(
        Config::default(),
        store.clone(),
        gateway.clone(),
        publisher.clone(),
    );

    let catalog = store.catalog();
    let restaurant = catalog.create_restaurant(
        "Thai Basil",
        "1 Main St",
        "America/Detroit",
        "acct_test",
    );
    let tax = catalog
        .create_tax_category(restaurant.id, "Food", Decimal::from(6))
        .unwrap();
    let entrees = catalog.create_category(restaurant.id, "Entrees");
    let curry = catalog.create_meal(entrees.id, "Curry", "Red curry", Decimal::new(2000, 2), tax.id);
    let rice = catalog.create_meal(entrees.id, "Rice", "Jasmine rice", Decimal::new(200, 2), tax.id);

    let accounts = store.accounts();
    let user = accounts.create_user("ann@example.com", Some("Ann"));
    accounts.issue_token(user.id, "customer-token");
    let customer = accounts.create_customer(user.id, "cus_ann");

    Fixture {
        state,
        gateway,
        publisher,
        restaurant,
        user,
        customer,
        curry,
        rice,
    }
}

impl Fixture {
    /// Staff member attached to the fixture restaurant
    pub fn staff(&self) -> (User, swick_server::db::models::Staff) {
        let accounts = self.state.store.accounts();
        let user = accounts.create_user("sam@example.com", Some("Sam"));
        accounts.issue_token(user.id, "staff-token");
        let staff = accounts.create_staff(user.id, Some(self.restaurant.id));
        (user, staff)
    }
}
