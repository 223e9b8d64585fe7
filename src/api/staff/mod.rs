//! Staff API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/server", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/pusher_auth", post(handler::pusher_auth))
        .route("/get_orders", get(handler::get_orders))
        .route("/get_order/{order_id}", get(handler::get_order))
        .route("/get_order_details/{order_id}", get(handler::get_order_details))
        .route("/get_order_items_to_cook", get(handler::get_order_items_to_cook))
        .route("/get_items_to_send", get(handler::get_items_to_send))
        .route(
            "/update_order_item_status",
            post(handler::update_order_item_status),
        )
        .route("/delete_request", post(handler::delete_request))
        .route("/get_info", get(handler::get_info))
}
