//! Carrier-facing shipment types
//!
//! Provider-specific request/response shapes stay inside the carrier
//! clients; these are the canonical types that cross the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DeliveryMode, DeliveryProvider};

/// A carrier territory identifier. Yalidine addresses communes by UUID,
/// ZR Express addresses wilayas by numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerritoryRef {
    Id(Uuid),
    Code(u16),
}

impl std::fmt::Display for TerritoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerritoryRef::Id(id) => write!(f, "{}", id),
            TerritoryRef::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Canonical shipment request, shaped once and translated per provider
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest {
    /// Order id, doubling as the carrier-side idempotency reference
    pub order_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Digits only, no separators
    pub phone: String,
    pub address: String,
    pub wilaya: String,
    pub city: String,
    /// Human-readable summary of the ordered products
    pub product_summary: String,
    /// Declared amount the carrier collects on delivery
    pub amount_to_collect: Decimal,
    pub delivery_mode: DeliveryMode,
    pub pickup_point_id: Option<String>,
}

/// Canonical response from shipment creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentReceipt {
    pub provider: DeliveryProvider,
    pub tracking: String,
    pub label_url: Option<String>,
}
