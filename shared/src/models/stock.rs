//! Stock item models
//!
//! One `StockItem` per SKU (fabric, accessory, packaging). Balance fields
//! are mutated exclusively through ledger transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockPosition;

/// A tracked inventory line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    /// Unique natural key, e.g. "FAB-LIN-NOIR-150"
    pub sku: String,
    pub name: String,
    pub quantity_on_hand: i32,
    pub quantity_reserved: i32,
    pub average_cost: Decimal,
    pub total_value: Decimal,
    pub low_stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    pub fn quantity_available(&self) -> i32 {
        self.quantity_on_hand - self.quantity_reserved
    }

    pub fn position(&self) -> StockPosition {
        StockPosition {
            on_hand: self.quantity_on_hand,
            reserved: self.quantity_reserved,
            average_cost: self.average_cost,
            total_value: self.total_value,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity_available() <= self.low_stock_threshold
    }
}

/// Input for creating a stock item by natural key
#[derive(Debug, Clone, Deserialize)]
pub struct NewStockItem {
    pub sku: String,
    pub name: String,
    pub low_stock_threshold: Option<i32>,
}
