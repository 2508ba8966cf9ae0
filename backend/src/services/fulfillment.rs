//! Order fulfillment state machine
//!
//! Drives status transitions and their ledger effects. Each transition is
//! a check-and-set under the order's row lock, composed with the matching
//! reservation-engine operation in one commit. Carrier calls happen after
//! the commit, never under a lock; a failed carrier call triggers the
//! compensating transaction before the error is returned.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::CarrierGateway;
use crate::services::orders::{load_items, lock_order};
use crate::services::reservation::{
    consume_in_tx, release_in_tx, reserve_in_tx, unconsume_in_tx, ReservationResult,
};
use shared::{FulfillmentEvent, Order, OrderItem, OrderStatus, ShipmentReceipt};

/// Fulfillment service: transitions plus their ledger and carrier effects
#[derive(Clone)]
pub struct FulfillmentService {
    db: PgPool,
    carriers: CarrierGateway,
}

/// Outcome of a successful ship
#[derive(Debug, Serialize)]
pub struct ShipOutcome {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub tracking: String,
    pub label_url: Option<String>,
}

#[derive(Debug, FromRow)]
struct ItemWithNameRow {
    id: Uuid,
    order_id: Uuid,
    stock_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    name: String,
}

async fn load_items_with_names(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<(OrderItem, String)>> {
    let rows = sqlx::query_as::<_, ItemWithNameRow>(
        "SELECT oi.id, oi.order_id, oi.stock_item_id, oi.quantity, oi.unit_price, si.name
         FROM order_items oi
         JOIN stock_items si ON si.id = oi.stock_item_id
         WHERE oi.order_id = $1
         ORDER BY oi.stock_item_id",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                OrderItem {
                    id: r.id,
                    order_id: r.order_id,
                    stock_item_id: r.stock_item_id,
                    quantity: r.quantity,
                    unit_price: r.unit_price,
                },
                r.name,
            )
        })
        .collect())
}

/// Write the new status with its transition timestamp
async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
) -> AppResult<()> {
    let timestamp_column = match status {
        OrderStatus::Pending => None,
        OrderStatus::Confirmed => Some("confirmed_at"),
        OrderStatus::Shipped => Some("shipped_at"),
        OrderStatus::Delivered => Some("delivered_at"),
        OrderStatus::Cancelled => Some("cancelled_at"),
    };

    let sql = match timestamp_column {
        Some(column) => format!(
            "UPDATE orders SET status = $1, {} = NOW() WHERE id = $2",
            column
        ),
        // Back to PENDING: the previous confirmation no longer holds
        None => "UPDATE orders SET status = $1, confirmed_at = NULL WHERE id = $2".to_string(),
    };

    sqlx::query(&sql)
        .bind(status.as_str())
        .bind(order_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

impl FulfillmentService {
    pub fn new(db: PgPool, carriers: CarrierGateway) -> Self {
        Self { db, carriers }
    }

    /// PENDING -> CONFIRMED: reserve every line, all-or-nothing
    pub async fn reserve(&self, order_id: Uuid) -> AppResult<ReservationResult> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::Reserve)?;

        let items = load_items(&mut tx, order_id).await?;
        let transactions = reserve_in_tx(&mut tx, order_id, &items).await?;
        set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        tracing::info!(%order_id, lines = transactions.len(), "Order reserved");
        Ok(ReservationResult {
            order_id,
            reserved_lines: transactions.len(),
            transactions,
        })
    }

    /// CONFIRMED -> PENDING: release the reservation
    pub async fn cancel_reservation(&self, order_id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::CancelReservation)?;

        release_in_tx(&mut tx, order_id).await?;
        set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        tracing::info!(%order_id, "Reservation cancelled");
        self.fetch(order_id).await
    }

    /// PENDING/CONFIRMED -> CANCELLED: release if reserved, else no-op
    pub async fn cancel(&self, order_id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::Cancel)?;

        release_in_tx(&mut tx, order_id).await?;
        set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        tracing::info!(%order_id, "Order cancelled");
        self.fetch(order_id).await
    }

    /// CONFIRMED -> SHIPPED: consume stock, then create the carrier parcel.
    ///
    /// Stock consumption and the status write commit first; the carrier
    /// call runs with no lock held. If the carrier fails (rejection,
    /// timeout, unresolvable territory), the compensating transaction
    /// restores the reservation and the CONFIRMED status, so a retry is
    /// safe and cannot double-consume.
    pub async fn ship(&self, order_id: Uuid) -> AppResult<ShipOutcome> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::Ship)?;
        if order.tracking_number.is_some() {
            // A previous ship already went through; don't create a second parcel
            return Err(AppError::InvalidTransition(format!(
                "Order {} already has a shipment",
                order_id
            )));
        }

        let items = load_items_with_names(&mut tx, order_id).await?;
        consume_in_tx(&mut tx, order_id).await?;
        set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        match self.carriers.create_shipment(&order, &items).await {
            Ok(receipt) => {
                self.record_shipment(order_id, &receipt).await?;
                tracing::info!(%order_id, tracking = %receipt.tracking, "Order shipped");
                Ok(ShipOutcome {
                    order_id,
                    status: next,
                    tracking: receipt.tracking,
                    label_url: receipt.label_url,
                })
            }
            Err(carrier_error) => {
                tracing::warn!(%order_id, error = %carrier_error, "Shipment failed, compensating");
                if let Err(compensation_error) = self.compensate_ship(order_id).await {
                    // The ledger now disagrees with the order status; this
                    // needs operator attention, so log loudly and surface
                    // the original carrier error regardless.
                    tracing::error!(
                        %order_id,
                        error = %compensation_error,
                        "Ship compensation failed"
                    );
                }
                Err(carrier_error)
            }
        }
    }

    /// SHIPPED -> DELIVERED, no ledger effect
    pub async fn mark_delivered(&self, order_id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::MarkDelivered)?;
        set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        self.fetch(order_id).await
    }

    /// SHIPPED -> CANCELLED on a carrier-reported failure or return.
    /// Stock was already consumed; recovering it is a manual, carrier-side
    /// return flow outside this system.
    pub async fn carrier_failed(&self, order_id: Uuid, raw_status: &str) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        let next = order.status.apply(FulfillmentEvent::CarrierFailed)?;
        set_status(&mut tx, order_id, next).await?;
        sqlx::query("UPDATE orders SET tracking_status = $1 WHERE id = $2")
            .bind(raw_status)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::warn!(%order_id, raw_status, "Carrier reported failure");
        self.fetch(order_id).await
    }

    /// Admin-triggered direct status change. The requested status is mapped
    /// to its transition so the ledger effects always come along.
    pub async fn update_status(&self, order_id: Uuid, requested: OrderStatus) -> AppResult<Order> {
        match requested {
            OrderStatus::Confirmed => {
                self.reserve(order_id).await?;
                self.fetch(order_id).await
            }
            OrderStatus::Pending => self.cancel_reservation(order_id).await,
            OrderStatus::Shipped => {
                self.ship(order_id).await?;
                self.fetch(order_id).await
            }
            OrderStatus::Delivered => self.mark_delivered(order_id).await,
            OrderStatus::Cancelled => self.cancel(order_id).await,
        }
    }

    async fn fetch(&self, order_id: Uuid) -> AppResult<Order> {
        crate::services::orders::OrderService::new(self.db.clone())
            .get(order_id)
            .await
    }

    async fn record_shipment(&self, order_id: Uuid, receipt: &ShipmentReceipt) -> AppResult<()> {
        sqlx::query("UPDATE orders SET tracking_number = $1 WHERE id = $2")
            .bind(&receipt.tracking)
            .bind(order_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Reverse a committed ship after a carrier failure: restore on-hand
    /// and reserved quantities, revert the status, clear the ship timestamp.
    async fn compensate_ship(&self, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        // Only an order still SHIPPED gets reverted; a delivery or failure
        // that landed in the meantime wins
        if order.status != OrderStatus::Shipped {
            tracing::warn!(%order_id, status = %order.status, "Skipping ship revert");
            return Ok(());
        }
        unconsume_in_tx(&mut tx, order_id).await?;
        sqlx::query(
            "UPDATE orders SET status = $1, shipped_at = NULL, tracking_number = NULL
             WHERE id = $2",
        )
        .bind(OrderStatus::Confirmed.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}
