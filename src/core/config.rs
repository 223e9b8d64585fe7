//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | HTTP_PORT | 8000 | HTTP API port |
//! | ENVIRONMENT | development | Runtime environment |
//! | STRIPE_SECRET_KEY | (empty) | Payment provider secret key |
//! | PUSHER_APP_ID / PUSHER_KEY / PUSHER_SECRET / PUSHER_CLUSTER | (empty / us2) | Pub/sub channel credentials |
//! | LOG_DIR | (unset) | Optional directory for daily log files |

/// Pub/sub channel service credentials
#[derive(Debug, Clone, Default)]
pub struct PusherConfig {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub cluster: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Payment provider secret key
    pub stripe_secret_key: String,
    /// Pub/sub channel credentials
    pub pusher: PusherConfig,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            pusher: PusherConfig {
                app_id: std::env::var("PUSHER_APP_ID").unwrap_or_default(),
                key: std::env::var("PUSHER_KEY").unwrap_or_default(),
                secret: std::env::var("PUSHER_SECRET").unwrap_or_default(),
                cluster: std::env::var("PUSHER_CLUSTER").unwrap_or_else(|_| "us2".into()),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
