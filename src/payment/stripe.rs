//! Stripe integration via REST API (no SDK dependency)
//!
//! Order charges run on the restaurant's connected account (the
//! `Stripe-Account` header). Saved cards live on the platform customer and
//! are cloned onto the connected account per charge.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    CardSummary, ChargeOutcome, ChargeRequest, ConfirmOutcome, GatewayError, IntentCard,
    PaymentGateway,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

pub struct StripeGateway {
    secret_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE.to_string())
    }

    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            secret_key,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    async fn post_form(
        &self,
        path: &str,
        account: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<Value, GatewayError> {
        let mut req = self
            .http
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(params);
        if let Some(account) = account {
            req = req.header("Stripe-Account", account);
        }
        let resp: Value = req
            .send()
            .await
            .map_err(|e| GatewayError::Api(e.to_string()))?
            .json()
            .await
            .map_err(|e| GatewayError::Api(e.to_string()))?;
        Ok(resp)
    }

    async fn get(
        &self,
        path: &str,
        account: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<Value, GatewayError> {
        let mut req = self
            .http
            .get(format!("{}{path}", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query);
        if let Some(account) = account {
            req = req.header("Stripe-Account", account);
        }
        let resp: Value = req
            .send()
            .await
            .map_err(|e| GatewayError::Api(e.to_string()))?
            .json()
            .await
            .map_err(|e| GatewayError::Api(e.to_string()))?;
        Ok(resp)
    }

    /// Copy a platform payment method onto a connected account
    async fn clone_payment_method(
        &self,
        gateway_account_id: &str,
        customer_gateway_id: &str,
        payment_method_id: &str,
    ) -> Result<Result<String, ChargeOutcome>, GatewayError> {
        let resp = self
            .post_form(
                "/v1/payment_methods",
                Some(gateway_account_id),
                &[
                    ("customer", customer_gateway_id),
                    ("payment_method", payment_method_id),
                ],
            )
            .await?;
        if let Some(outcome) = card_error(&resp)? {
            return Ok(Err(outcome));
        }
        let id = resp["id"]
            .as_str()
            .ok_or_else(|| GatewayError::Api(format!("payment method clone failed: {resp}")))?;
        Ok(Ok(id.to_string()))
    }
}

/// Extract a card decline from an error payload; transport-level and other
/// provider errors become [`GatewayError::Api`]
fn card_error(resp: &Value) -> Result<Option<ChargeOutcome>, GatewayError> {
    let Some(error) = resp.get("error") else {
        return Ok(None);
    };
    let message = error["message"].as_str().unwrap_or("card error").to_string();
    if error["type"].as_str() == Some("card_error") {
        Ok(Some(ChargeOutcome::CardError { error: message }))
    } else {
        Err(GatewayError::Api(message))
    }
}

fn decline_message(intent: &Value) -> Option<String> {
    intent["last_payment_error"]["message"]
        .as_str()
        .map(String::from)
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(&self, email: &str) -> Result<String, GatewayError> {
        let resp = self
            .post_form("/v1/customers", None, &[("email", email)])
            .await?;
        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::Api(format!("customer create failed: {resp}")))
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let method_id = match &request.customer_gateway_id {
            Some(customer) => {
                match self
                    .clone_payment_method(
                        &request.gateway_account_id,
                        customer,
                        &request.payment_method_id,
                    )
                    .await?
                {
                    Ok(id) => id,
                    Err(outcome) => return Ok(outcome),
                }
            }
            None => request.payment_method_id.clone(),
        };

        let amount = request.amount_cents.to_string();
        let order_id = request.order_id.to_string();
        let resp = self
            .post_form(
                "/v1/payment_intents",
                Some(&request.gateway_account_id),
                &[
                    ("amount", amount.as_str()),
                    ("currency", "usd"),
                    ("payment_method", method_id.as_str()),
                    ("receipt_email", request.receipt_email.as_str()),
                    ("confirm", "true"),
                    ("confirmation_method", "manual"),
                    ("use_stripe_sdk", "true"),
                    ("metadata[order_id]", order_id.as_str()),
                ],
            )
            .await?;

        if let Some(outcome) = card_error(&resp)? {
            return Ok(outcome);
        }

        let intent_id = resp["id"]
            .as_str()
            .ok_or_else(|| GatewayError::Api(format!("intent create failed: {resp}")))?
            .to_string();
        match resp["status"].as_str() {
            Some("succeeded") => Ok(ChargeOutcome::Succeeded { intent_id }),
            Some("requires_action") | Some("requires_source_action") => {
                let client_secret = resp["client_secret"]
                    .as_str()
                    .ok_or_else(|| GatewayError::Api("intent missing client_secret".into()))?
                    .to_string();
                Ok(ChargeOutcome::RequiresAction {
                    intent_id,
                    client_secret,
                })
            }
            Some("requires_payment_method") | Some("requires_source") => {
                Ok(ChargeOutcome::RequiresPaymentMethod {
                    intent_id,
                    error: decline_message(&resp),
                })
            }
            _ => Ok(ChargeOutcome::Unhandled),
        }
    }

    async fn confirm_retry(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
        expected_order_id: u64,
    ) -> Result<ConfirmOutcome, GatewayError> {
        let intent = self
            .get(
                &format!("/v1/payment_intents/{intent_id}"),
                Some(gateway_account_id),
                &[],
            )
            .await?;
        if intent.get("error").is_some() {
            return Ok(ConfirmOutcome::NotOwned);
        }
        if intent["metadata"]["order_id"].as_str() != Some(&expected_order_id.to_string()) {
            return Ok(ConfirmOutcome::NotOwned);
        }

        let resp = self
            .post_form(
                &format!("/v1/payment_intents/{intent_id}/confirm"),
                Some(gateway_account_id),
                &[],
            )
            .await?;
        if let Some(outcome) = card_error(&resp)? {
            let ChargeOutcome::CardError { error } = outcome else {
                return Ok(ConfirmOutcome::Unhandled);
            };
            return Ok(ConfirmOutcome::CardError { error });
        }

        match resp["status"].as_str() {
            Some("succeeded") => {
                let amount_cents = resp["amount"]
                    .as_i64()
                    .ok_or_else(|| GatewayError::Api("intent missing amount".into()))?;
                Ok(ConfirmOutcome::Succeeded { amount_cents })
            }
            Some("requires_payment_method") | Some("requires_source") => {
                Ok(ConfirmOutcome::RequiresPaymentMethod {
                    error: decline_message(&resp),
                })
            }
            _ => Ok(ConfirmOutcome::Unhandled),
        }
    }

    async fn intent_payment_method(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
    ) -> Result<IntentCard, GatewayError> {
        let intent = self
            .get(
                &format!("/v1/payment_intents/{intent_id}"),
                Some(gateway_account_id),
                &[],
            )
            .await?;
        if let Some(error) = intent.get("error") {
            return Err(GatewayError::Api(
                error["message"].as_str().unwrap_or("intent fetch failed").into(),
            ));
        }
        Ok(IntentCard {
            payment_method_id: intent["payment_method"].as_str().map(String::from),
        })
    }

    async fn processing_fee(
        &self,
        gateway_account_id: &str,
        intent_id: &str,
    ) -> Result<Option<Decimal>, GatewayError> {
        let intent = self
            .get(
                &format!("/v1/payment_intents/{intent_id}"),
                Some(gateway_account_id),
                &[("expand[]", "latest_charge.balance_transaction")],
            )
            .await?;
        let Some(details) = intent["latest_charge"]["balance_transaction"]["fee_details"].as_array()
        else {
            return Ok(None);
        };
        let fee = details
            .iter()
            .filter(|d| d["type"].as_str() == Some("stripe_fee"))
            .filter_map(|d| d["amount"].as_i64())
            .sum::<i64>();
        Ok(Some(Decimal::new(fee, 2)))
    }

    async fn create_setup_intent(&self, customer_gateway_id: &str) -> Result<String, GatewayError> {
        let resp = self
            .post_form("/v1/setup_intents", None, &[("customer", customer_gateway_id)])
            .await?;
        resp["client_secret"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::Api(format!("setup intent failed: {resp}")))
    }

    async fn list_cards(&self, customer_gateway_id: &str) -> Result<Vec<CardSummary>, GatewayError> {
        let resp = self
            .get(
                "/v1/payment_methods",
                None,
                &[("customer", customer_gateway_id), ("type", "card")],
            )
            .await?;
        let Some(data) = resp["data"].as_array() else {
            return Err(GatewayError::Api(format!("card list failed: {resp}")));
        };
        Ok(data
            .iter()
            .filter_map(|pm| {
                Some(CardSummary {
                    payment_method_id: pm["id"].as_str()?.to_string(),
                    brand: pm["card"]["brand"].as_str()?.to_string(),
                    last4: pm["card"]["last4"].as_str()?.to_string(),
                    exp_month: pm["card"]["exp_month"].as_i64()?,
                    exp_year: pm["card"]["exp_year"].as_i64()?,
                })
            })
            .collect())
    }

    async fn detach_card(
        &self,
        customer_gateway_id: &str,
        payment_method_id: &str,
    ) -> Result<bool, GatewayError> {
        // refuse to detach a method that is not on this customer
        let pm = self
            .get(&format!("/v1/payment_methods/{payment_method_id}"), None, &[])
            .await?;
        if pm["customer"].as_str() != Some(customer_gateway_id) {
            return Ok(false);
        }
        let resp = self
            .post_form(
                &format!("/v1/payment_methods/{payment_method_id}/detach"),
                None,
                &[],
            )
            .await?;
        if let Some(error) = resp.get("error") {
            return Err(GatewayError::Api(
                error["message"].as_str().unwrap_or("detach failed").into(),
            ));
        }
        Ok(true)
    }
}
