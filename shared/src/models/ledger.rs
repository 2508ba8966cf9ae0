//! Inventory ledger models and balance arithmetic
//!
//! Every change to a stock item's balances goes through
//! [`StockPosition::apply`], which enforces the ledger invariants:
//! `0 <= reserved <= on_hand`, `total_value == on_hand * average_cost`,
//! and weighted-average cost recomputation on inbound valued transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Transaction direction relative to the pool it touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    In,
    Out,
}

impl TransactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionDirection::In => "in",
            TransactionDirection::Out => "out",
        }
    }
}

impl std::str::FromStr for TransactionDirection {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(TransactionDirection::In),
            "out" => Ok(TransactionDirection::Out),
            _ => Err("Unknown transaction direction"),
        }
    }
}

/// Kinds of ledger transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Opening balance for a stock item
    Initial,
    /// Inbound purchase affecting valuation
    Purchase,
    /// Hold against an order: available -> reserved
    Reservation,
    /// Reservation returned to availability
    Release,
    /// Reserved stock leaving permanently at shipment
    Consumption,
    /// Manual correction of on-hand quantity
    Adjustment,
}

impl std::str::FromStr for TransactionKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(TransactionKind::Initial),
            "purchase" => Ok(TransactionKind::Purchase),
            "reservation" => Ok(TransactionKind::Reservation),
            "release" => Ok(TransactionKind::Release),
            "consumption" => Ok(TransactionKind::Consumption),
            "adjustment" => Ok(TransactionKind::Adjustment),
            _ => Err("Unknown transaction kind"),
        }
    }
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Initial => "initial",
            TransactionKind::Purchase => "purchase",
            TransactionKind::Reservation => "reservation",
            TransactionKind::Release => "release",
            TransactionKind::Consumption => "consumption",
            TransactionKind::Adjustment => "adjustment",
        }
    }

    /// The direction this kind is allowed to carry. Adjustments go both ways.
    pub fn allows(&self, direction: TransactionDirection) -> bool {
        match self {
            TransactionKind::Initial | TransactionKind::Purchase | TransactionKind::Reservation => {
                direction == TransactionDirection::In
            }
            TransactionKind::Release | TransactionKind::Consumption => {
                direction == TransactionDirection::Out
            }
            TransactionKind::Adjustment => true,
        }
    }
}

/// Errors raised by ledger arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Transaction quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("Unit cost is required for {kind} transactions", kind = .0.as_str())]
    MissingUnitCost(TransactionKind),

    #[error("{kind} transactions cannot be {direction}", kind = .0.as_str(), direction = .1.as_str())]
    InvalidDirection(TransactionKind, TransactionDirection),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Order has no outstanding reservation")]
    NothingReserved,
}

/// An immutable, append-only ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub stock_item_id: Uuid,
    pub direction: TransactionDirection,
    pub kind: TransactionKind,
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub balance_before: i32,
    pub balance_after: i32,
    pub value_before: Decimal,
    pub value_after: Decimal,
    pub avg_cost_before: Decimal,
    pub avg_cost_after: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Running balances of one stock item, independent of persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    pub on_hand: i32,
    pub reserved: i32,
    pub average_cost: Decimal,
    pub total_value: Decimal,
}

impl StockPosition {
    pub fn empty() -> Self {
        Self {
            on_hand: 0,
            reserved: 0,
            average_cost: Decimal::ZERO,
            total_value: Decimal::ZERO,
        }
    }

    /// Quantity not held by any reservation
    pub fn available(&self) -> i32 {
        self.on_hand - self.reserved
    }

    /// Apply one ledger transaction, returning the new position together
    /// with the before/after audit fields for the transaction row.
    ///
    /// Reservations and releases only move quantity between available and
    /// reserved; they never touch on-hand quantity or valuation.
    /// Consumption removes reserved stock from on-hand at its existing cost
    /// basis. Only INITIAL/PURCHASE (and costed inbound adjustments)
    /// recompute the weighted-average cost.
    pub fn apply(
        &self,
        direction: TransactionDirection,
        kind: TransactionKind,
        quantity: i32,
        unit_cost: Option<Decimal>,
    ) -> Result<AppliedTransaction, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        if !kind.allows(direction) {
            return Err(LedgerError::InvalidDirection(kind, direction));
        }

        let before = *self;
        let mut after = *self;

        match (direction, kind) {
            (TransactionDirection::In, TransactionKind::Initial)
            | (TransactionDirection::In, TransactionKind::Purchase) => {
                let cost = unit_cost.ok_or(LedgerError::MissingUnitCost(kind))?;
                after.receive(quantity, Some(cost));
            }
            (TransactionDirection::In, TransactionKind::Adjustment) => {
                after.receive(quantity, unit_cost);
            }
            (TransactionDirection::In, TransactionKind::Reservation) => {
                if quantity > before.available() {
                    return Err(LedgerError::InsufficientStock {
                        requested: quantity,
                        available: before.available(),
                    });
                }
                after.reserved += quantity;
            }
            (TransactionDirection::Out, TransactionKind::Release) => {
                if quantity > before.reserved {
                    return Err(LedgerError::InsufficientStock {
                        requested: quantity,
                        available: before.reserved,
                    });
                }
                after.reserved -= quantity;
            }
            (TransactionDirection::Out, TransactionKind::Consumption) => {
                if quantity > before.reserved {
                    return Err(LedgerError::InsufficientStock {
                        requested: quantity,
                        available: before.reserved,
                    });
                }
                after.on_hand -= quantity;
                after.reserved -= quantity;
                after.total_value = Decimal::from(after.on_hand) * after.average_cost;
            }
            (TransactionDirection::Out, TransactionKind::Adjustment) => {
                // Adjustments cannot break reservations already held
                if quantity > before.available() {
                    return Err(LedgerError::InsufficientStock {
                        requested: quantity,
                        available: before.available(),
                    });
                }
                after.on_hand -= quantity;
                after.total_value = Decimal::from(after.on_hand) * after.average_cost;
            }
            _ => return Err(LedgerError::InvalidDirection(kind, direction)),
        }

        Ok(AppliedTransaction {
            position: after,
            balance_before: before.on_hand,
            balance_after: after.on_hand,
            value_before: before.total_value,
            value_after: after.total_value,
            avg_cost_before: before.average_cost,
            avg_cost_after: after.average_cost,
        })
    }

    /// Inbound receipt into on-hand. A unit cost recomputes the weighted
    /// average; without one the existing cost basis is carried forward.
    fn receive(&mut self, quantity: i32, unit_cost: Option<Decimal>) {
        let new_on_hand = self.on_hand + quantity;
        match unit_cost {
            Some(cost) => {
                let new_avg = if self.on_hand == 0 {
                    cost
                } else {
                    (self.total_value + Decimal::from(quantity) * cost)
                        / Decimal::from(new_on_hand)
                };
                self.average_cost = new_avg;
            }
            None => {}
        }
        self.on_hand = new_on_hand;
        self.total_value = Decimal::from(self.on_hand) * self.average_cost;
    }

    /// Invariant check used by tests and the ledger service's debug asserts
    pub fn is_consistent(&self) -> bool {
        self.on_hand >= 0
            && self.reserved >= 0
            && self.reserved <= self.on_hand
            && self.total_value == Decimal::from(self.on_hand) * self.average_cost
    }
}

/// Result of applying a transaction to a [`StockPosition`]
#[derive(Debug, Clone, Copy)]
pub struct AppliedTransaction {
    pub position: StockPosition,
    pub balance_before: i32,
    pub balance_after: i32,
    pub value_before: Decimal,
    pub value_after: Decimal,
    pub avg_cost_before: Decimal,
    pub avg_cost_after: Decimal,
}
