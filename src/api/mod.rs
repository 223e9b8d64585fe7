//! API routing
//!
//! Two route families mirroring the two mobile apps:
//!
//! - [`customer`] - `/customer/...` menu browsing, ordering, payment, cards
//! - [`staff`] - `/server/...` dashboard, kitchen queues, requests
//!
//! Menu browsing is open; everything else authenticates with an opaque
//! `Authorization: Token ...` header.

pub mod customer;
pub mod dto;
pub mod staff;

use axum::{Json, Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(customer::router())
        .merge(staff::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
