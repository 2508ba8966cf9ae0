//! Yalidine carrier client
//!
//! Header-authenticated JSON API. Communes are addressed by UUID; parcels
//! are created in batches keyed by the caller's order reference, which
//! doubles as the idempotency key on retries.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{DeliveryMode, DeliveryProvider, OrderStatus, ShipmentReceipt, ShipmentRequest};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::YalidineConfig;
use crate::error::{AppError, AppResult};

/// Yalidine API client
#[derive(Clone)]
pub struct YalidineClient {
    client: Client,
    base_url: String,
    api_id: String,
    api_token: String,
    origin_wilaya: String,
}

/// Commune search response
#[derive(Debug, Deserialize)]
struct CommuneSearchResponse {
    data: Vec<CommuneEntry>,
}

#[derive(Debug, Deserialize)]
struct CommuneEntry {
    id: Uuid,
    name: String,
}

/// Parcel creation payload (one element of the batch array)
#[derive(Debug, Serialize)]
struct ParcelPayload {
    order_id: String,
    firstname: String,
    familyname: String,
    contact_phone: String,
    address: String,
    from_wilaya_name: String,
    to_commune_id: Uuid,
    product_list: String,
    price: String,
    is_stopdesk: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopdesk_id: Option<String>,
}

/// Per-parcel creation result, keyed by order reference in the response map
#[derive(Debug, Deserialize)]
struct ParcelResult {
    success: bool,
    #[serde(default)]
    tracking: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Tracking response
#[derive(Debug, Deserialize)]
struct ParcelStatusResponse {
    last_status: String,
}

impl YalidineClient {
    pub fn new(client: Client, config: &YalidineConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_id: config.api_id.clone(),
            api_token: config.api_token.clone(),
            origin_wilaya: config.origin_wilaya.clone(),
        }
    }

    fn send_error(e: reqwest::Error) -> AppError {
        AppError::CarrierUnavailable(format!("Yalidine request failed: {}", e))
    }

    /// Search communes by name and return the matching territory UUID
    pub async fn find_commune(&self, name: &str) -> AppResult<Uuid> {
        let normalized = shared::normalize_territory_name(name);
        let url = format!("{}/v1/communes?name={}", self.base_url, normalized);

        let response = self
            .client
            .get(&url)
            .header("X-API-ID", &self.api_id)
            .header("X-API-TOKEN", &self.api_token)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "Yalidine commune search failed: {} - {}",
                status, body
            )));
        }

        let data: CommuneSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid commune response: {}", e)))?;

        data.data
            .iter()
            .find(|c| shared::normalize_territory_name(&c.name) == normalized)
            .or_else(|| data.data.first())
            .map(|c| c.id)
            .ok_or_else(|| AppError::TerritoryNotFound(name.to_string()))
    }

    /// Create a parcel for the given shipment request
    pub async fn create_parcel(
        &self,
        request: &ShipmentRequest,
        to_commune_id: Uuid,
    ) -> AppResult<ShipmentReceipt> {
        let reference = request.order_id.to_string();
        let payload = vec![ParcelPayload {
            order_id: reference.clone(),
            firstname: request.first_name.clone(),
            familyname: request.last_name.clone(),
            contact_phone: request.phone.clone(),
            address: request.address.clone(),
            from_wilaya_name: self.origin_wilaya.clone(),
            to_commune_id,
            product_list: request.product_summary.clone(),
            price: request.amount_to_collect.to_string(),
            is_stopdesk: request.delivery_mode == DeliveryMode::PickupPoint,
            stopdesk_id: request.pickup_point_id.clone(),
        }];

        let url = format!("{}/v1/parcels", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-API-ID", &self.api_id)
            .header("X-API-TOKEN", &self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "Yalidine parcel creation failed: {} - {}",
                status, body
            )));
        }

        let results: HashMap<String, ParcelResult> = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid parcel response: {}", e)))?;

        let result = results
            .get(&reference)
            .ok_or_else(|| AppError::CarrierRejected("No result for parcel reference".into()))?;

        if !result.success {
            return Err(AppError::CarrierRejected(
                result
                    .message
                    .clone()
                    .unwrap_or_else(|| "Parcel refused".into()),
            ));
        }

        let tracking = result
            .tracking
            .clone()
            .ok_or_else(|| AppError::CarrierRejected("Parcel accepted without tracking".into()))?;

        Ok(ShipmentReceipt {
            provider: DeliveryProvider::Yalidine,
            tracking,
            label_url: result.label.clone(),
        })
    }

    /// Fetch the raw provider status string for a tracking number
    pub async fn get_status(&self, tracking: &str) -> AppResult<String> {
        let url = format!("{}/v1/parcels/{}", self.base_url, tracking);
        let response = self
            .client
            .get(&url)
            .header("X-API-ID", &self.api_id)
            .header("X-API-TOKEN", &self.api_token)
            .send()
            .await
            .map_err(Self::send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CarrierRejected(format!(
                "Yalidine tracking fetch failed: {} - {}",
                status, body
            )));
        }

        let data: ParcelStatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::CarrierRejected(format!("Invalid tracking response: {}", e)))?;

        Ok(data.last_status)
    }
}

/// Map Yalidine's status vocabulary to the canonical order status.
///
/// Total over the provider's known vocabulary; anything unknown maps to
/// `None` and the caller keeps the order's current status.
///
/// | Raw status            | Canonical  |
/// |-----------------------|------------|
/// | Pas encore expédié    | Confirmed  |
/// | A vérifier            | Confirmed  |
/// | En préparation        | Confirmed  |
/// | Expédié               | Shipped    |
/// | Centre                | Shipped    |
/// | Vers Wilaya           | Shipped    |
/// | Reçu à Wilaya         | Shipped    |
/// | En attente du client  | Shipped    |
/// | Sorti en livraison    | Shipped    |
/// | En attente            | Shipped    |
/// | Tentative échouée     | Shipped    |
/// | Livré                 | Delivered  |
/// | Echèc livraison       | Cancelled  |
/// | Retour vers centre    | Cancelled  |
/// | Retourné au vendeur   | Cancelled  |
/// | Echange échoué        | Cancelled  |
pub fn map_status(raw: &str) -> Option<OrderStatus> {
    match raw.trim() {
        "Pas encore expédié" | "A vérifier" | "En préparation" => Some(OrderStatus::Confirmed),
        "Expédié" | "Centre" | "Vers Wilaya" | "Reçu à Wilaya" | "En attente du client"
        | "Sorti en livraison" | "En attente" | "Tentative échouée" => Some(OrderStatus::Shipped),
        "Livré" => Some(OrderStatus::Delivered),
        "Echèc livraison" | "Retour vers centre" | "Retourné au vendeur" | "Echange échoué" => {
            Some(OrderStatus::Cancelled)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vocabulary_is_total() {
        let vocabulary = [
            "Pas encore expédié",
            "A vérifier",
            "En préparation",
            "Expédié",
            "Centre",
            "Vers Wilaya",
            "Reçu à Wilaya",
            "En attente du client",
            "Sorti en livraison",
            "En attente",
            "Tentative échouée",
            "Livré",
            "Echèc livraison",
            "Retour vers centre",
            "Retourné au vendeur",
            "Echange échoué",
        ];
        for raw in vocabulary {
            assert!(map_status(raw).is_some(), "unmapped: {}", raw);
        }
    }

    #[test]
    fn unknown_status_maps_to_none() {
        assert_eq!(map_status("Statut inconnu"), None);
        assert_eq!(map_status(""), None);
    }

    #[test]
    fn delivered_and_failures() {
        assert_eq!(map_status("Livré"), Some(OrderStatus::Delivered));
        assert_eq!(
            map_status("Retourné au vendeur"),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(map_status(" Sorti en livraison "), Some(OrderStatus::Shipped));
    }
}
