//! HTTP handlers for order fulfillment endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::fulfillment::ShipOutcome;
use crate::services::orders::CreateOrderInput;
use crate::services::reservation::ReservationResult;
use crate::services::tracking::SyncOutcome;
use crate::services::{FulfillmentService, OrderService, TrackingService};
use crate::AppState;
use shared::{Order, OrderItem, OrderStatus};

/// Order with its line items
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

/// Create a new order in PENDING
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.create(input).await?;
    Ok(Json(order))
}

/// List orders, newest first
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<Order>>> {
    let service = OrderService::new(state.db);
    let orders = service.list().await?;
    Ok(Json(orders))
}

/// Get one order with its items
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let order = service.get(order_id).await?;
    let items = service.get_items(order_id).await?;
    Ok(Json(OrderDetail { order, items }))
}

/// Reserve stock for an order (PENDING -> CONFIRMED)
pub async fn reserve_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ReservationResult>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let result = service.reserve(order_id).await?;
    Ok(Json(result))
}

/// Release a reservation (CONFIRMED -> PENDING)
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let order = service.cancel_reservation(order_id).await?;
    Ok(Json(order))
}

/// Ship an order via its carrier (CONFIRMED -> SHIPPED)
pub async fn ship_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ShipOutcome>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let outcome = service.ship(order_id).await?;
    Ok(Json(outcome))
}

/// Mark an order delivered (SHIPPED -> DELIVERED)
pub async fn deliver_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let order = service.mark_delivered(order_id).await?;
    Ok(Json(order))
}

/// Cancel an order (PENDING/CONFIRMED -> CANCELLED)
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let order = service.cancel(order_id).await?;
    Ok(Json(order))
}

/// Set an order's status; routed through the matching transition so the
/// ledger effects always come along
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<Order>> {
    let service = FulfillmentService::new(state.db, state.carriers);
    let order = service.update_status(order_id, input.status).await?;
    Ok(Json(order))
}

/// Reconcile an order's status with its carrier
pub async fn sync_tracking(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SyncOutcome>> {
    let service = TrackingService::new(state.db, state.carriers);
    let outcome = service.sync(order_id).await?;
    Ok(Json(outcome))
}
