//! Order models and the fulfillment state machine
//!
//! Status flow: `Pending -> Confirmed -> Shipped -> Delivered`, with
//! `Cancelled` absorbing from Pending/Confirmed only. Once stock is
//! consumed and a carrier parcel exists, cancellation goes through a
//! carrier-side return flow outside this system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{DeliveryMode, DeliveryProvider};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err("Unknown order status"),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that drive the fulfillment state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentEvent {
    /// Stock reserved against the order
    Reserve,
    /// Reservation released, order back to Pending
    CancelReservation,
    /// Stock consumed and carrier parcel created
    Ship,
    /// Carrier reported final delivery
    MarkDelivered,
    /// Order cancelled before shipping
    Cancel,
    /// Carrier reported failure/return for a shipped parcel
    CarrierFailed,
}

/// Rejected transition, surfaced to callers unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot apply {event:?} to an order in status {from}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub event: FulfillmentEvent,
}

impl OrderStatus {
    /// The transition table. Anything not listed is rejected.
    pub fn apply(self, event: FulfillmentEvent) -> Result<OrderStatus, InvalidTransition> {
        use FulfillmentEvent::*;
        use OrderStatus::*;
        match (self, event) {
            (Pending, Reserve) => Ok(Confirmed),
            (Confirmed, CancelReservation) => Ok(Pending),
            (Confirmed, Ship) => Ok(Shipped),
            (Shipped, MarkDelivered) => Ok(Delivered),
            (Shipped, CarrierFailed) => Ok(Cancelled),
            (Pending, Cancel) | (Confirmed, Cancel) => Ok(Cancelled),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }
}

/// A placed order, as this core sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_wilaya: String,
    pub delivery_provider: DeliveryProvider,
    pub delivery_mode: DeliveryMode,
    /// Carrier stop-desk identifier for pickup-point deliveries
    pub pickup_point_id: Option<String>,
    pub shipping_price: Decimal,
    pub tracking_number: Option<String>,
    /// Raw provider status string, mirrored as-is
    pub tracking_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// One order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Sum of line totals plus shipping: the amount the carrier collects
pub fn amount_to_collect(items: &[OrderItem], shipping_price: Decimal) -> Decimal {
    items
        .iter()
        .map(|i| Decimal::from(i.quantity) * i.unit_price)
        .sum::<Decimal>()
        + shipping_price
}

/// What one tracking poll does to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Raw status unchanged since the last poll, or the order already
    /// reached DELIVERED
    Unchanged,
    /// Raw status recorded, order status untouched
    StatusRecorded,
    /// Carrier confirmed delivery
    Delivered,
    /// Carrier reported a failed or returned parcel
    Failed,
}

impl SyncAction {
    /// Fold a fetched carrier status into a sync decision.
    ///
    /// DELIVERED never regresses, and a raw status identical to the stored
    /// mirror is a no-op, so polling an unchanged parcel any number of
    /// times leaves the order exactly as it was.
    pub fn classify(
        status: OrderStatus,
        stored_raw: Option<&str>,
        fetched_raw: &str,
        mapped: Option<OrderStatus>,
    ) -> SyncAction {
        if status == OrderStatus::Delivered {
            return SyncAction::Unchanged;
        }
        if stored_raw == Some(fetched_raw) {
            return SyncAction::Unchanged;
        }
        match mapped {
            Some(OrderStatus::Delivered) => SyncAction::Delivered,
            Some(OrderStatus::Cancelled) => SyncAction::Failed,
            _ => SyncAction::StatusRecorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let s = OrderStatus::Pending;
        let s = s.apply(FulfillmentEvent::Reserve).unwrap();
        assert_eq!(s, OrderStatus::Confirmed);
        let s = s.apply(FulfillmentEvent::Ship).unwrap();
        assert_eq!(s, OrderStatus::Shipped);
        let s = s.apply(FulfillmentEvent::MarkDelivered).unwrap();
        assert_eq!(s, OrderStatus::Delivered);
        assert!(s.is_terminal());
    }

    #[test]
    fn cancellation_reachability() {
        assert_eq!(
            OrderStatus::Pending.apply(FulfillmentEvent::Cancel).unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            OrderStatus::Confirmed
                .apply(FulfillmentEvent::Cancel)
                .unwrap(),
            OrderStatus::Cancelled
        );
        // Post-ship cancellation only via carrier failure
        assert!(OrderStatus::Shipped.apply(FulfillmentEvent::Cancel).is_err());
        assert!(OrderStatus::Delivered
            .apply(FulfillmentEvent::Cancel)
            .is_err());
    }

    #[test]
    fn terminal_states_absorb() {
        use FulfillmentEvent::*;
        for event in [Reserve, CancelReservation, Ship, MarkDelivered, Cancel, CarrierFailed] {
            assert!(OrderStatus::Delivered.apply(event).is_err());
            assert!(OrderStatus::Cancelled.apply(event).is_err());
        }
    }

    #[test]
    fn double_ship_is_rejected() {
        let shipped = OrderStatus::Confirmed.apply(FulfillmentEvent::Ship).unwrap();
        let err = shipped.apply(FulfillmentEvent::Ship).unwrap_err();
        assert_eq!(err.from, OrderStatus::Shipped);
        assert_eq!(err.event, FulfillmentEvent::Ship);
    }
}
