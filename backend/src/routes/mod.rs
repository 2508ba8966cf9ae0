//! Route definitions for the order fulfillment backend

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/orders", order_routes())
        .nest("/stock", stock_routes())
}

/// Order fulfillment routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/status", put(handlers::update_order_status))
        .route("/:order_id/reserve", post(handlers::reserve_order))
        .route(
            "/:order_id/cancel-reservation",
            post(handlers::cancel_reservation),
        )
        .route("/:order_id/ship", post(handlers::ship_order))
        .route("/:order_id/deliver", post(handlers::deliver_order))
        .route("/:order_id/cancel", post(handlers::cancel_order))
        .route("/:order_id/sync-tracking", post(handlers::sync_tracking))
}

/// Stock and inventory ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_items).post(handlers::create_stock_item),
        )
        .route("/low-stock", get(handlers::low_stock))
        .route("/transactions", post(handlers::record_transaction))
        .route("/:stock_item_id", get(handlers::get_stock_item))
        .route(
            "/:stock_item_id/transactions",
            get(handlers::list_transactions),
        )
}
