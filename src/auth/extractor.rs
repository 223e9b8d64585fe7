//! Auth extractors
//!
//! Use these in protected handlers to resolve the opaque token into the
//! calling user and, for role-scoped endpoints, the role profile.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::extract_from_header;
use crate::core::ServerState;
use crate::db::models::{Customer, Staff, User};
use crate::utils::ApiError;

/// Any authenticated user
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;
        let token = extract_from_header(header).ok_or(ApiError::InvalidToken)?;
        let user = state
            .store
            .accounts()
            .resolve_token(token)
            .ok_or(ApiError::InvalidToken)?;

        let current = CurrentUser { user };
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// Authenticated user with a customer profile
#[derive(Debug, Clone)]
pub struct ActiveCustomer {
    pub user: User,
    pub customer: Customer,
}

impl FromRequestParts<ServerState> for ActiveCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user } = CurrentUser::from_request_parts(parts, state).await?;
        let customer = state
            .store
            .accounts()
            .customer_for_user(user.id)
            .ok_or(ApiError::InvalidRequest)?;
        Ok(ActiveCustomer { user, customer })
    }
}

/// Authenticated user with a staff profile
#[derive(Debug, Clone)]
pub struct ActiveStaff {
    pub user: User,
    pub staff: Staff,
}

impl ActiveStaff {
    /// The staff member's restaurant, or the domain error when unattached
    pub fn restaurant_id(&self) -> Result<u64, ApiError> {
        self.staff.restaurant_id.ok_or(ApiError::RestaurantNotSet)
    }
}

impl FromRequestParts<ServerState> for ActiveStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user } = CurrentUser::from_request_parts(parts, state).await?;
        let staff = state
            .store
            .accounts()
            .staff_for_user(user.id)
            .ok_or(ApiError::InvalidRequest)?;
        Ok(ActiveStaff { user, staff })
    }
}
