//! Pusher Channels integration via REST API (no SDK dependency)
//!
//! Two pieces of protocol: the private-channel subscription token returned
//! from the auth endpoints, and the signed trigger request to the events API.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde_json::Value;
use sha2::Sha256;

use crate::core::config::PusherConfig;

use super::{Channel, EventPublisher, NotifyError};

type HmacSha256 = Hmac<Sha256>;

pub struct PusherClient {
    config: PusherConfig,
    http: reqwest::Client,
}

impl PusherClient {
    pub fn new(config: PusherConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn sign(&self, message: &str) -> String {
        // key length never fails for hmac-sha256
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn events_url(&self) -> String {
        format!(
            "https://api-{}.pusher.com/apps/{}/events",
            self.config.cluster, self.config.app_id
        )
    }
}

#[async_trait]
impl EventPublisher for PusherClient {
    async fn publish(
        &self,
        channels: &[Channel],
        event: &str,
        payload: Value,
    ) -> Result<(), NotifyError> {
        let names: Vec<String> = channels.iter().map(Channel::name).collect();
        let body = serde_json::json!({
            "name": event,
            "channels": names,
            "data": payload.to_string(),
        })
        .to_string();

        let body_md5 = hex::encode(Md5::digest(body.as_bytes()));
        let timestamp = chrono::Utc::now().timestamp().to_string();
        // query keys must be sorted for the signature
        let query = format!(
            "auth_key={}&auth_timestamp={}&auth_version=1.0&body_md5={}",
            self.config.key, timestamp, body_md5
        );
        let to_sign = format!("POST\n/apps/{}/events\n{}", self.config.app_id, query);
        let signature = self.sign(&to_sign);

        let resp = self
            .http
            .post(format!(
                "{}?{}&auth_signature={}",
                self.events_url(),
                query,
                signature
            ))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError::Api(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api(format!("{status}: {text}")));
        }
        Ok(())
    }

    fn subscription_token(&self, socket_id: &str, channel: &Channel) -> String {
        let signature = self.sign(&format!("{socket_id}:{}", channel.name()));
        format!("{}:{}", self.config.key, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PusherClient {
        PusherClient::new(PusherConfig {
            app_id: "1234".into(),
            key: "appkey".into(),
            secret: "appsecret".into(),
            cluster: "us2".into(),
        })
    }

    #[test]
    fn subscription_token_is_key_colon_hmac() {
        let token = client().subscription_token("82714.3341", &Channel::Customer(7));
        let (key, sig) = token.split_once(':').unwrap();
        assert_eq!(key, "appkey");
        // hmac-sha256 hex digest
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_depends_on_socket_and_channel() {
        let c = client();
        let a = c.subscription_token("1.1", &Channel::Customer(7));
        let b = c.subscription_token("1.2", &Channel::Customer(7));
        let d = c.subscription_token("1.1", &Channel::Customer(8));
        assert_ne!(a, b);
        assert_ne!(a, d);
    }
}
