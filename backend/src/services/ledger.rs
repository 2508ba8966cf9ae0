//! Inventory ledger service
//!
//! Persists ledger transactions and the balances they produce. Every
//! mutation takes a row lock on the stock item, so the before/after audit
//! fields are sequenced without lost updates; the arithmetic itself lives
//! in `shared::StockPosition`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    LedgerTransaction, NewStockItem, StockItem, TransactionDirection, TransactionKind,
};

/// Ledger service over the stock items and their transaction log
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct StockItemRow {
    id: Uuid,
    sku: String,
    name: String,
    quantity_on_hand: i32,
    quantity_reserved: i32,
    average_cost: Decimal,
    total_value: Decimal,
    low_stock_threshold: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const STOCK_COLUMNS: &str = "id, sku, name, quantity_on_hand, quantity_reserved, \
     average_cost, total_value, low_stock_threshold, created_at, updated_at";

impl StockItemRow {
    fn into_model(self) -> StockItem {
        StockItem {
            id: self.id,
            sku: self.sku,
            name: self.name,
            quantity_on_hand: self.quantity_on_hand,
            quantity_reserved: self.quantity_reserved,
            average_cost: self.average_cost,
            total_value: self.total_value,
            low_stock_threshold: self.low_stock_threshold,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    id: Uuid,
    stock_item_id: Uuid,
    direction: String,
    kind: String,
    quantity: i32,
    unit_cost: Option<Decimal>,
    balance_before: i32,
    balance_after: i32,
    value_before: Decimal,
    value_after: Decimal,
    avg_cost_before: Decimal,
    avg_cost_after: Decimal,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

const LEDGER_COLUMNS: &str = "id, stock_item_id, direction, kind, quantity, unit_cost, \
     balance_before, balance_after, value_before, value_after, avg_cost_before, \
     avg_cost_after, reference_type, reference_id, created_by, created_at";

impl LedgerRow {
    fn into_model(self) -> AppResult<LedgerTransaction> {
        Ok(LedgerTransaction {
            id: self.id,
            stock_item_id: self.stock_item_id,
            direction: self
                .direction
                .parse::<TransactionDirection>()
                .map_err(|e| AppError::Internal(format!("Corrupt ledger direction: {}", e)))?,
            kind: self
                .kind
                .parse::<TransactionKind>()
                .map_err(|e| AppError::Internal(format!("Corrupt ledger kind: {}", e)))?,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            value_before: self.value_before,
            value_after: self.value_after,
            avg_cost_before: self.avg_cost_before,
            avg_cost_after: self.avg_cost_after,
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

/// What caused a ledger transaction
#[derive(Debug, Clone)]
pub struct LedgerReference {
    pub reference_type: String,
    pub reference_id: Uuid,
}

impl LedgerReference {
    pub fn order(order_id: Uuid) -> Self {
        Self {
            reference_type: "order".to_string(),
            reference_id: order_id,
        }
    }
}

/// Input for recording a ledger transaction
#[derive(Debug, Deserialize)]
pub struct ApplyTransactionInput {
    pub stock_item_id: Uuid,
    pub direction: TransactionDirection,
    pub kind: TransactionKind,
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_by: Option<String>,
}

/// Apply one ledger transaction inside the caller's transaction.
///
/// Locks the stock row, runs the pure arithmetic, writes the new balances
/// and the immutable audit row. The reservation engine and the fulfillment
/// service compose several of these under a single commit.
pub(crate) async fn apply_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    stock_item_id: Uuid,
    direction: TransactionDirection,
    kind: TransactionKind,
    quantity: i32,
    unit_cost: Option<Decimal>,
    reference: Option<&LedgerReference>,
    created_by: Option<&str>,
) -> AppResult<LedgerTransaction> {
    let row = sqlx::query_as::<_, StockItemRow>(&format!(
        "SELECT {} FROM stock_items WHERE id = $1 FOR UPDATE",
        STOCK_COLUMNS
    ))
    .bind(stock_item_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

    let item = row.into_model();
    let applied = item.position().apply(direction, kind, quantity, unit_cost)?;
    debug_assert!(applied.position.is_consistent());

    sqlx::query(
        "UPDATE stock_items
         SET quantity_on_hand = $1, quantity_reserved = $2, average_cost = $3,
             total_value = $4, updated_at = NOW()
         WHERE id = $5",
    )
    .bind(applied.position.on_hand)
    .bind(applied.position.reserved)
    .bind(applied.position.average_cost)
    .bind(applied.position.total_value)
    .bind(stock_item_id)
    .execute(&mut **tx)
    .await?;

    let ledger_row = sqlx::query_as::<_, LedgerRow>(&format!(
        "INSERT INTO inventory_transactions (
            stock_item_id, direction, kind, quantity, unit_cost,
            balance_before, balance_after, value_before, value_after,
            avg_cost_before, avg_cost_after, reference_type, reference_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {}",
        LEDGER_COLUMNS
    ))
    .bind(stock_item_id)
    .bind(direction.as_str())
    .bind(kind.as_str())
    .bind(quantity)
    .bind(unit_cost)
    .bind(applied.balance_before)
    .bind(applied.balance_after)
    .bind(applied.value_before)
    .bind(applied.value_after)
    .bind(applied.avg_cost_before)
    .bind(applied.avg_cost_after)
    .bind(reference.map(|r| r.reference_type.clone()))
    .bind(reference.map(|r| r.reference_id))
    .bind(created_by)
    .fetch_one(&mut **tx)
    .await?;

    ledger_row.into_model()
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a single ledger transaction under its own commit
    pub async fn apply_transaction(
        &self,
        input: ApplyTransactionInput,
    ) -> AppResult<LedgerTransaction> {
        let reference = match (&input.reference_type, input.reference_id) {
            (Some(t), Some(id)) => Some(LedgerReference {
                reference_type: t.clone(),
                reference_id: id,
            }),
            _ => None,
        };

        let mut tx = self.db.begin().await?;
        let transaction = apply_in_tx(
            &mut tx,
            input.stock_item_id,
            input.direction,
            input.kind,
            input.quantity,
            input.unit_cost,
            reference.as_ref(),
            input.created_by.as_deref(),
        )
        .await?;
        tx.commit().await?;

        Ok(transaction)
    }

    /// Create a stock item by natural key, or return the existing one
    pub async fn find_or_create(&self, input: NewStockItem) -> AppResult<StockItem> {
        sqlx::query(
            "INSERT INTO stock_items (sku, name, low_stock_threshold)
             VALUES ($1, $2, $3)
             ON CONFLICT (sku) DO NOTHING",
        )
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.low_stock_threshold.unwrap_or(0))
        .execute(&self.db)
        .await?;

        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE sku = $1",
            STOCK_COLUMNS
        ))
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Get a stock item by id
    pub async fn get_item(&self, stock_item_id: Uuid) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE id = $1",
            STOCK_COLUMNS
        ))
        .bind(stock_item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        Ok(row.into_model())
    }

    /// List all stock items
    pub async fn list_items(&self) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items ORDER BY sku",
            STOCK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockItemRow::into_model).collect())
    }

    /// Items at or below their low-stock threshold
    pub async fn low_stock(&self) -> AppResult<Vec<StockItem>> {
        let items = self.list_items().await?;
        Ok(items.into_iter().filter(StockItem::is_low_stock).collect())
    }

    /// Transaction log for a stock item, newest first
    pub async fn list_transactions(
        &self,
        stock_item_id: Uuid,
    ) -> AppResult<Vec<LedgerTransaction>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_items WHERE id = $1)",
        )
        .bind(stock_item_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Stock item".to_string()));
        }

        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {} FROM inventory_transactions
             WHERE stock_item_id = $1
             ORDER BY created_at DESC",
            LEDGER_COLUMNS
        ))
        .bind(stock_item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LedgerRow::into_model).collect()
    }
}
