//! ZR Express (Procolis) carrier client
//!
//! Token/key header authentication, numeric wilaya codes, and a batch
//! "Colis" envelope on every endpoint. The caller's order reference is
//! echoed back and dedupes retried submissions on the provider side.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{DeliveryMode, DeliveryProvider, OrderStatus, ShipmentReceipt, ShipmentRequest};

use crate::config::ZrExpressConfig;
use crate::error::{AppError, AppResult};

/// ZR Express API client
#[derive(Clone)]
pub struct ZrExpressClient {
    client: Client,
    base_url: String,
    token: String,
    key: String,
}

/// Tariff listing row, used for wilaya name -> numeric code resolution
#[derive(Debug, Deserialize)]
struct TarifEntry {
    #[serde(rename = "IDWilaya")]
    id_wilaya: u16,
    #[serde(rename = "Wilaya")]
    wilaya: String,
}

#[derive(Debug, Deserialize)]
struct TarificationResponse {
    #[serde(rename = "Tarification", default)]
    tarification: Vec<TarifEntry>,
}

/// Parcel creation envelope
#[derive(Debug, Serialize)]
struct AddColisRequest {
    #[serde(rename = "Colis")]
    colis: Vec<ColisPayload>,
}

#[derive(Debug, Serialize)]
struct ColisPayload {
    #[serde(rename = "TypeLivraison")]
    type_livraison: String,
    #[serde(rename = "Client")]
    client: String,
    #[serde(rename = "MobileA")]
    mobile: String,
    #[serde(rename = "Adresse")]
    adresse: String,
    #[serde(rename = "IDWilaya")]
    id_wilaya: String,
    #[serde(rename = "Commune")]
    commune: String,
    #[serde(rename = "TProduit")]
    produit: String,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "TypeColis")]
    type_colis: String,
    #[serde(rename = "Confrimee")]
    confirmee: String,
    #[serde(rename = "IDExterne")]
    id_externe: String,
}

#[derive(Debug, Deserialize)]
struct AddColisResponse {
    #[serde(rename = "COUNT", default)]
    count: u32,
    #[serde(rename = "MESSAGE", default)]
    message: Option<String>,
    #[serde(rename = "Colis", default)]
    colis: Vec<ColisResult>,
}

#[derive(Debug, Deserialize)]
struct ColisResult {
    #[serde(rename = "Tracking", default)]
    tracking: Option<String>,
    #[serde(rename = "MESSAGE", default)]
    message: Option<String>,
}

/// Tracking lookup envelope
#[derive(Debug, Serialize)]
struct LireRequest {
    #[serde(rename = "Colis")]
    colis: Vec<LireEntry>,
}

#[derive(Debug, Serialize)]
struct LireEntry {
    #[serde(rename = "Tracking")]
    tracking: String,
}

#[derive(Debug, Deserialize)]
struct LireResponse {
    #[serde(rename = "Colis", default)]
    colis: Vec<LireResult>,
}

#[derive(Debug, Deserialize)]
struct LireResult {
    #[serde(rename = "Situation", default)]
    situation: Option<String>,
}

impl ZrExpressClient {
    pub fn new(client: Client, config: &ZrExpressConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            key: config.key.clone(),
        }
    }

    fn send_error(e: reqwest::Error) -> AppError {
        AppError::CarrierUnavailable(format!("ZR Express request failed: {}", e))
    }

    /// Resolve a wilaya name (or legacy numeric code) to the provider's
    /// numeric wilaya code via the tariff listing.
    pub async fn find_wilaya_code(&self, name: &str) -> AppResult<u16> {
        // Legacy checkout payloads carry the numeric code directly
        if let Ok(code) = name.trim().parse::<u16>() {
            return Ok(code);
        }

        let url = format!("{}/tarification", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("token", &self.token)
            .header("key", &self.key)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "ZR Express tariff fetch failed: {} - {}",
                status, body
            )));
        }

        let data: TarificationResponse = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid tariff response: {}", e)))?;

        let normalized = shared::normalize_territory_name(name);
        data.tarification
            .iter()
            .find(|t| shared::normalize_territory_name(&t.wilaya) == normalized)
            .map(|t| t.id_wilaya)
            .ok_or_else(|| AppError::TerritoryNotFound(name.to_string()))
    }

    /// Submit a parcel
    pub async fn create_parcel(
        &self,
        request: &ShipmentRequest,
        wilaya_code: u16,
    ) -> AppResult<ShipmentReceipt> {
        let payload = AddColisRequest {
            colis: vec![ColisPayload {
                type_livraison: match request.delivery_mode {
                    DeliveryMode::Home => "0".into(),
                    DeliveryMode::PickupPoint => "1".into(),
                },
                client: format!("{} {}", request.first_name, request.last_name)
                    .trim()
                    .to_string(),
                mobile: request.phone.clone(),
                adresse: request.address.clone(),
                id_wilaya: wilaya_code.to_string(),
                commune: request.city.clone(),
                produit: request.product_summary.clone(),
                total: request.amount_to_collect.to_string(),
                type_colis: "0".into(),
                confirmee: "1".into(),
                id_externe: request.order_id.to_string(),
            }],
        };

        let url = format!("{}/add_colis", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("token", &self.token)
            .header("key", &self.key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "ZR Express parcel creation failed: {} - {}",
                status, body
            )));
        }

        let data: AddColisResponse = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid parcel response: {}", e)))?;

        if data.count == 0 {
            return Err(AppError::CarrierRejected(
                data.message.unwrap_or_else(|| "Parcel refused".into()),
            ));
        }

        let result = data
            .colis
            .first()
            .ok_or_else(|| AppError::CarrierRejected("Empty parcel response".into()))?;

        let tracking = result.tracking.clone().ok_or_else(|| {
            AppError::CarrierRejected(
                result
                    .message
                    .clone()
                    .unwrap_or_else(|| "Parcel accepted without tracking".into()),
            )
        })?;

        Ok(ShipmentReceipt {
            provider: DeliveryProvider::ZrExpress,
            tracking,
            // ZR Express exposes labels only through its dashboard
            label_url: None,
        })
    }

    /// Fetch the raw provider status ("Situation") for a tracking number
    pub async fn get_status(&self, tracking: &str) -> AppResult<String> {
        let url = format!("{}/lire", self.base_url);
        let payload = LireRequest {
            colis: vec![LireEntry {
                tracking: tracking.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("token", &self.token)
            .header("key", &self.key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "ZR Express tracking fetch failed: {} - {}",
                status, body
            )));
        }

        let data: LireResponse = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid tracking response: {}", e)))?;

        data.colis
            .first()
            .and_then(|c| c.situation.clone())
            .ok_or_else(|| AppError::CarrierRejected("No situation for tracking".into()))
    }
}

/// Map ZR Express's status vocabulary to the canonical order status.
///
/// Total over the provider's known vocabulary; anything unknown maps to
/// `None` and the caller keeps the order's current status.
///
/// | Raw status         | Canonical  |
/// |--------------------|------------|
/// | En Préparation     | Confirmed  |
/// | Prêt A Expédier    | Confirmed  |
/// | Expédiée           | Shipped    |
/// | En Transit         | Shipped    |
/// | Centre Wilaya      | Shipped    |
/// | En Livraison       | Shipped    |
/// | Tentative          | Shipped    |
/// | Livrée             | Delivered  |
/// | Retour Navette     | Cancelled  |
/// | Retournée          | Cancelled  |
/// | Annulée            | Cancelled  |
pub fn map_status(raw: &str) -> Option<OrderStatus> {
    match raw.trim() {
        "En Préparation" | "Prêt A Expédier" => Some(OrderStatus::Confirmed),
        "Expédiée" | "En Transit" | "Centre Wilaya" | "En Livraison" | "Tentative" => {
            Some(OrderStatus::Shipped)
        }
        "Livrée" => Some(OrderStatus::Delivered),
        "Retour Navette" | "Retournée" | "Annulée" => Some(OrderStatus::Cancelled),
        _ => None,
    }
}
