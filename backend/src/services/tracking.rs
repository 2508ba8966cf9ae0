//! Tracking reconciliation
//!
//! Pulls the carrier's current parcel status and folds it back into the
//! order. The carrier is the source of truth for the last mile, but an
//! order that already reached DELIVERED never regresses.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::CarrierGateway;
use crate::services::fulfillment::FulfillmentService;
use crate::services::orders::OrderService;
use shared::{Order, OrderStatus, SyncAction};

#[derive(Clone)]
pub struct TrackingService {
    db: PgPool,
    carriers: CarrierGateway,
}

#[derive(Debug, Serialize)]
pub struct SyncOutcome {
    pub order_id: Uuid,
    pub action: SyncAction,
    pub raw_status: String,
    pub order: Order,
}

impl TrackingService {
    pub fn new(db: PgPool, carriers: CarrierGateway) -> Self {
        Self { db, carriers }
    }

    /// Reconcile one order against its carrier
    pub async fn sync(&self, order_id: Uuid) -> AppResult<SyncOutcome> {
        let orders = OrderService::new(self.db.clone());
        let order = orders.get(order_id).await?;

        // Terminal success: nothing a carrier says can change it
        if order.status == OrderStatus::Delivered {
            let raw = order.tracking_status.clone().unwrap_or_default();
            return Ok(SyncOutcome {
                order_id,
                action: SyncAction::Unchanged,
                raw_status: raw,
                order,
            });
        }

        let tracking = order.tracking_number.as_deref().ok_or_else(|| {
            AppError::Validation {
                field: "tracking_number".to_string(),
                message: "Order has no tracking number to sync".to_string(),
                message_fr: "La commande n'a pas de numéro de suivi à synchroniser".to_string(),
            }
        })?;

        let (raw_status, mapped) = self
            .carriers
            .get_status(order.delivery_provider, tracking)
            .await?;

        let fulfillment = FulfillmentService::new(self.db.clone(), self.carriers.clone());
        let action = SyncAction::classify(
            order.status,
            order.tracking_status.as_deref(),
            &raw_status,
            mapped,
        );
        let order = match action {
            SyncAction::Unchanged => order,
            SyncAction::Delivered => {
                self.record_raw_status(order_id, &raw_status).await?;
                fulfillment.mark_delivered(order_id).await?
            }
            SyncAction::Failed => fulfillment.carrier_failed(order_id, &raw_status).await?,
            // Intermediate carrier states only move the raw mirror
            SyncAction::StatusRecorded => {
                self.record_raw_status(order_id, &raw_status).await?;
                orders.get(order_id).await?
            }
        };

        tracing::info!(%order_id, raw_status, ?action, "Tracking synced");
        Ok(SyncOutcome {
            order_id,
            action,
            raw_status,
            order,
        })
    }

    async fn record_raw_status(&self, order_id: Uuid, raw: &str) -> AppResult<()> {
        sqlx::query("UPDATE orders SET tracking_status = $1 WHERE id = $2")
            .bind(raw)
            .bind(order_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
