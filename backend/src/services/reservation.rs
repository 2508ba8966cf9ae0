//! Reservation engine
//!
//! Reserves, releases and consumes stock on behalf of an order. A
//! reservation is all-or-nothing across the order's lines: every affected
//! stock row is locked (ascending id order, to keep concurrent orders from
//! deadlocking) and any shortfall rolls the whole transaction back.

use serde::Serialize;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{apply_in_tx, LedgerReference};
use shared::{LedgerTransaction, OrderItem, TransactionDirection, TransactionKind};

/// Outcome of a successful reservation
#[derive(Debug, Serialize)]
pub struct ReservationResult {
    pub order_id: Uuid,
    pub reserved_lines: usize,
    pub transactions: Vec<LedgerTransaction>,
}

/// Per-item quantity still held for an order:
/// reservations minus releases minus consumptions.
async fn outstanding_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<(Uuid, i32)>> {
    let rows = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT stock_item_id,
                SUM(CASE kind
                    WHEN 'reservation' THEN quantity
                    WHEN 'release' THEN -quantity
                    WHEN 'consumption' THEN -quantity
                    ELSE 0 END) AS outstanding
         FROM inventory_transactions
         WHERE reference_type = 'order' AND reference_id = $1
         GROUP BY stock_item_id
         HAVING SUM(CASE kind
                    WHEN 'reservation' THEN quantity
                    WHEN 'release' THEN -quantity
                    WHEN 'consumption' THEN -quantity
                    ELSE 0 END) > 0
         ORDER BY stock_item_id",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(|(id, qty)| (id, qty as i32)).collect())
}

/// Consumed quantity per item for an order that has not been restored yet:
/// consumptions minus compensating inbound adjustments.
async fn consumed_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<(Uuid, i32)>> {
    let rows = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT stock_item_id,
                SUM(CASE
                    WHEN kind = 'consumption' THEN quantity
                    WHEN kind = 'adjustment' AND direction = 'in' THEN -quantity
                    ELSE 0 END) AS consumed
         FROM inventory_transactions
         WHERE reference_type = 'order' AND reference_id = $1
         GROUP BY stock_item_id
         HAVING SUM(CASE
                    WHEN kind = 'consumption' THEN quantity
                    WHEN kind = 'adjustment' AND direction = 'in' THEN -quantity
                    ELSE 0 END) > 0
         ORDER BY stock_item_id",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(|(id, qty)| (id, qty as i32)).collect())
}

/// Reserve all of an order's lines inside the caller's transaction.
///
/// Lines on the same stock item are merged before locking. Any
/// `InsufficientStock` propagates and the caller's rollback leaves every
/// line untouched.
pub(crate) async fn reserve_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    items: &[OrderItem],
) -> AppResult<Vec<LedgerTransaction>> {
    if items.is_empty() {
        return Err(AppError::Validation {
            field: "items".to_string(),
            message: "Order has no items to reserve".to_string(),
            message_fr: "La commande n'a aucun article à réserver".to_string(),
        });
    }

    let mut merged: Vec<(Uuid, i32)> = Vec::new();
    for item in items {
        match merged.iter_mut().find(|(id, _)| *id == item.stock_item_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => merged.push((item.stock_item_id, item.quantity)),
        }
    }
    // Deterministic lock order across concurrent reservations
    merged.sort_by_key(|(id, _)| *id);

    let reference = LedgerReference::order(order_id);
    let mut transactions = Vec::with_capacity(merged.len());
    for (stock_item_id, quantity) in merged {
        let transaction = apply_in_tx(
            tx,
            stock_item_id,
            TransactionDirection::In,
            TransactionKind::Reservation,
            quantity,
            None,
            Some(&reference),
            None,
        )
        .await?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Release whatever the order still holds. No-op when nothing is
/// outstanding, so repeated releases are safe.
pub(crate) async fn release_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<LedgerTransaction>> {
    let outstanding = outstanding_in_tx(tx, order_id).await?;
    let reference = LedgerReference::order(order_id);

    let mut transactions = Vec::with_capacity(outstanding.len());
    for (stock_item_id, quantity) in outstanding {
        let transaction = apply_in_tx(
            tx,
            stock_item_id,
            TransactionDirection::Out,
            TransactionKind::Release,
            quantity,
            None,
            Some(&reference),
            None,
        )
        .await?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Convert the order's outstanding reservations into consumptions.
/// Fails with `NothingReserved` when the order holds nothing, which is
/// what stops a second ship from consuming twice.
pub(crate) async fn consume_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<LedgerTransaction>> {
    let outstanding = outstanding_in_tx(tx, order_id).await?;
    if outstanding.is_empty() {
        return Err(AppError::NothingReserved);
    }

    let reference = LedgerReference::order(order_id);
    let mut transactions = Vec::with_capacity(outstanding.len());
    for (stock_item_id, quantity) in outstanding {
        let transaction = apply_in_tx(
            tx,
            stock_item_id,
            TransactionDirection::Out,
            TransactionKind::Consumption,
            quantity,
            None,
            Some(&reference),
            None,
        )
        .await?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Reverse the order's consumptions after a failed carrier call: an
/// inbound adjustment restores on-hand quantity, then a fresh reservation
/// restores the hold, leaving the ledger exactly as before the ship.
pub(crate) async fn unconsume_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<()> {
    let consumed = consumed_in_tx(tx, order_id).await?;
    let reference = LedgerReference::order(order_id);

    for (stock_item_id, quantity) in consumed {
        apply_in_tx(
            tx,
            stock_item_id,
            TransactionDirection::In,
            TransactionKind::Adjustment,
            quantity,
            None,
            Some(&reference),
            None,
        )
        .await?;
        apply_in_tx(
            tx,
            stock_item_id,
            TransactionDirection::In,
            TransactionKind::Reservation,
            quantity,
            None,
            Some(&reference),
            None,
        )
        .await?;
    }

    Ok(())
}
