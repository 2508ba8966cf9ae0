//! HTTP handlers for stock and inventory ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::ApplyTransactionInput;
use crate::services::LedgerService;
use crate::AppState;
use shared::{LedgerTransaction, NewStockItem, StockItem};

/// Create a stock item, or return the existing one for the SKU
pub async fn create_stock_item(
    State(state): State<AppState>,
    Json(input): Json<NewStockItem>,
) -> AppResult<Json<StockItem>> {
    let service = LedgerService::new(state.db);
    let item = service.find_or_create(input).await?;
    Ok(Json(item))
}

/// List all stock items
pub async fn list_stock_items(State(state): State<AppState>) -> AppResult<Json<Vec<StockItem>>> {
    let service = LedgerService::new(state.db);
    let items = service.list_items().await?;
    Ok(Json(items))
}

/// Get one stock item with its current balances
pub async fn get_stock_item(
    State(state): State<AppState>,
    Path(stock_item_id): Path<Uuid>,
) -> AppResult<Json<StockItem>> {
    let service = LedgerService::new(state.db);
    let item = service.get_item(stock_item_id).await?;
    Ok(Json(item))
}

/// Items whose available quantity is at or below their threshold
pub async fn low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<StockItem>>> {
    let service = LedgerService::new(state.db);
    let items = service.low_stock().await?;
    Ok(Json(items))
}

/// Record a ledger transaction (purchase, adjustment, ...)
pub async fn record_transaction(
    State(state): State<AppState>,
    Json(input): Json<ApplyTransactionInput>,
) -> AppResult<Json<LedgerTransaction>> {
    let service = LedgerService::new(state.db);
    let transaction = service.apply_transaction(input).await?;
    Ok(Json(transaction))
}

/// Transaction log for a stock item, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(stock_item_id): Path<Uuid>,
) -> AppResult<Json<Vec<LedgerTransaction>>> {
    let service = LedgerService::new(state.db);
    let transactions = service.list_transactions(stock_item_id).await?;
    Ok(Json(transactions))
}
