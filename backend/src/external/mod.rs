//! External carrier integrations
//!
//! Two independent carriers behind one gateway. Provider-specific request
//! and response shapes never leave their client module; the gateway hands
//! back canonical `ShipmentReceipt`s and status strings.

pub mod territory;
pub mod yalidine;
pub mod zrexpress;

pub use territory::TerritoryCache;
pub use yalidine::YalidineClient;
pub use zrexpress::ZrExpressClient;

use reqwest::Client;
use rust_decimal::Decimal;
use shared::{
    amount_to_collect, normalize_phone, product_summary, split_recipient_name, DeliveryProvider,
    Order, OrderItem, OrderStatus, ShipmentReceipt, ShipmentRequest, TerritoryRef,
};
use std::time::Duration;

use crate::config::CarriersConfig;
use crate::error::{AppError, AppResult};

/// Uniform interface over the shipping providers
#[derive(Clone)]
pub struct CarrierGateway {
    yalidine: YalidineClient,
    zrexpress: ZrExpressClient,
    territories: std::sync::Arc<TerritoryCache>,
}

impl CarrierGateway {
    pub fn new(config: &CarriersConfig) -> anyhow::Result<Self> {
        // Carrier calls must be bounded; they are never made under a lock
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            yalidine: YalidineClient::new(client.clone(), &config.yalidine),
            zrexpress: ZrExpressClient::new(client, &config.zrexpress),
            territories: std::sync::Arc::new(TerritoryCache::new()),
        })
    }

    /// Create a shipment for the order with its configured provider.
    ///
    /// Territory resolution failures abort before anything is sent to the
    /// carrier, so there are no side effects to unwind.
    pub async fn create_shipment(
        &self,
        order: &Order,
        items: &[(OrderItem, String)],
    ) -> AppResult<ShipmentReceipt> {
        let request = build_shipment_request(order, items);
        match order.delivery_provider {
            DeliveryProvider::Yalidine => {
                let territory = self
                    .resolve(DeliveryProvider::Yalidine, &order.customer_city)
                    .await?;
                let TerritoryRef::Id(commune_id) = territory else {
                    return Err(AppError::Internal(
                        "Yalidine territory cache holds a non-UUID entry".into(),
                    ));
                };
                self.yalidine.create_parcel(&request, commune_id).await
            }
            DeliveryProvider::ZrExpress => {
                let territory = self
                    .resolve(DeliveryProvider::ZrExpress, &order.customer_wilaya)
                    .await?;
                let TerritoryRef::Code(wilaya_code) = territory else {
                    return Err(AppError::Internal(
                        "ZR Express territory cache holds a non-numeric entry".into(),
                    ));
                };
                self.zrexpress.create_parcel(&request, wilaya_code).await
            }
        }
    }

    /// Fetch the carrier's raw status and its canonical mapping.
    ///
    /// An unmapped raw string comes back as `(raw, None)`; the caller keeps
    /// the order's current status rather than guessing.
    pub async fn get_status(
        &self,
        provider: DeliveryProvider,
        tracking: &str,
    ) -> AppResult<(String, Option<OrderStatus>)> {
        match provider {
            DeliveryProvider::Yalidine => {
                let raw = self.yalidine.get_status(tracking).await?;
                let canonical = yalidine::map_status(&raw);
                Ok((raw, canonical))
            }
            DeliveryProvider::ZrExpress => {
                let raw = self.zrexpress.get_status(tracking).await?;
                let canonical = zrexpress::map_status(&raw);
                Ok((raw, canonical))
            }
        }
    }

    /// Resolve a territory through the cache, querying the provider on miss
    async fn resolve(&self, provider: DeliveryProvider, name: &str) -> AppResult<TerritoryRef> {
        if let Some(hit) = self.territories.get(provider, name) {
            return Ok(hit);
        }

        let resolved = match provider {
            DeliveryProvider::Yalidine => {
                TerritoryRef::Id(self.yalidine.find_commune(name).await?)
            }
            DeliveryProvider::ZrExpress => {
                TerritoryRef::Code(self.zrexpress.find_wilaya_code(name).await?)
            }
        };

        self.territories.insert(provider, name, resolved.clone());
        Ok(resolved)
    }
}

/// Shape the canonical shipment request out of an order and its lines
pub fn build_shipment_request(order: &Order, items: &[(OrderItem, String)]) -> ShipmentRequest {
    let (first_name, last_name) = split_recipient_name(&order.customer_name);
    let lines: Vec<(String, i32)> = items
        .iter()
        .map(|(item, name)| (name.clone(), item.quantity))
        .collect();
    let order_items: Vec<OrderItem> = items.iter().map(|(item, _)| item.clone()).collect();
    let amount: Decimal = amount_to_collect(&order_items, order.shipping_price);

    ShipmentRequest {
        order_id: order.id,
        first_name,
        last_name,
        phone: normalize_phone(&order.customer_phone),
        address: order.customer_address.clone(),
        wilaya: order.customer_wilaya.clone(),
        city: order.customer_city.clone(),
        product_summary: product_summary(&lines),
        amount_to_collect: amount,
        delivery_mode: order.delivery_mode,
        pickup_point_id: order.pickup_point_id.clone(),
    }
}
