//! Unified error handling and the API response envelope
//!
//! Every domain outcome is reported as HTTP 200 with a JSON body carrying a
//! `status` discriminator; clients branch on `status`, never on the HTTP
//! code. The only exceptions are channel authorization (uniform 403 with no
//! detail) and genuine internal faults (500).
//!
//! ```json
//! { "status": "success", ... }
//! { "status": "meal_disabled", "meal_name": "Pad Thai" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Domain failure taxonomy, serialized as the `status` discriminator
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiError {
    #[error("invalid or missing token")]
    InvalidToken,

    #[error("restaurant does not exist")]
    RestaurantDoesNotExist,

    #[error("category does not exist")]
    CategoryDoesNotExist,

    #[error("meal does not exist")]
    MealDoesNotExist,

    #[error("meal '{meal_name}' is disabled")]
    MealDisabled { meal_name: String },

    #[error("order does not exist")]
    OrderDoesNotExist,

    /// Ownership mismatch or malformed request data
    #[error("invalid request")]
    InvalidRequest,

    #[error("request option does not exist")]
    RequestOptionDoesNotExist,

    /// Customer already has this request open
    #[error("request in progress")]
    RequestInProgress,

    /// Staff member is not attached to a restaurant yet
    #[error("restaurant not set")]
    RestaurantNotSet,

    #[error("name not set")]
    NameNotSet,

    /// Amount below the payment provider's chargeable minimum
    #[error("invalid charge amount")]
    InvalidChargeAmount,

    /// Payment intent or method not owned by the requesting customer
    #[error("invalid stripe id")]
    InvalidStripeId,

    /// Transient provider failure, distinct from a declined card
    #[error("stripe api error")]
    StripeApiError,

    /// Unrecognized provider intent state (defensive catch-all)
    #[error("unhandled intent status")]
    UnhandledStatus,

    /// Channel authorization refused; deliberately carries no detail
    #[error("channel authorization refused")]
    ChannelAuthRefused,

    #[error("internal error: {message}")]
    Internal {
        #[serde(skip_serializing)]
        message: String,
    },
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            // Uniform refusal regardless of which validation failed
            ApiError::ChannelAuthRefused => StatusCode::FORBIDDEN.into_response(),
            ApiError::Internal { message } => {
                error!(error = %message, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            // Domain failures are 200 + discriminator
            _ => (StatusCode::OK, Json(self)).into_response(),
        }
    }
}

/// Successful response envelope: `status: "success"` plus the payload fields
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub body: T,
}

/// Payload for endpoints that only report `status`
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Wrap a payload in the success envelope
pub fn success<T: Serialize>(body: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success",
        body,
    })
}

/// Bare `{"status": "success"}` response
pub fn success_empty() -> Json<Envelope<Empty>> {
    success(Empty {})
}

/// Handler result type alias
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
