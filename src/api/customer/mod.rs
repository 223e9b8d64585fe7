//! Customer API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/customer", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/pusher_auth", post(handler::pusher_auth))
        .route("/get_restaurants", get(handler::get_restaurants))
        .route("/get_restaurant/{restaurant_id}", get(handler::get_restaurant))
        .route("/get_categories/{restaurant_id}", get(handler::get_categories))
        .route(
            "/get_meals/{restaurant_id}/{category_id}",
            get(handler::get_meals),
        )
        .route("/get_meal/{meal_id}", get(handler::get_meal))
        .route("/place_order", post(handler::place_order))
        .route("/add_tip", post(handler::add_tip))
        .route("/retry_order_payment", post(handler::retry_order_payment))
        .route("/retry_tip_payment", post(handler::retry_tip_payment))
        .route("/get_orders", get(handler::get_orders))
        .route("/get_order_details/{order_id}", get(handler::get_order_details))
        .route("/make_request", post(handler::make_request))
        .route("/get_info", get(handler::get_info))
        .route("/setup_card", post(handler::setup_card))
        .route("/remove_card", post(handler::remove_card))
        .route("/get_cards", get(handler::get_cards))
}
