//! Order persistence: row mapping, creation at checkout, queries
//!
//! Only the fulfillment components mutate order status and tracking
//! fields; this module owns the row <-> model conversion they share.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{DeliveryMode, DeliveryProvider, Order, OrderItem, OrderStatus};

/// Order queries and checkout-side creation
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub status: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_wilaya: String,
    pub delivery_provider: String,
    pub delivery_mode: String,
    pub pickup_point_id: Option<String>,
    pub shipping_price: Decimal,
    pub tracking_number: Option<String>,
    pub tracking_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub(crate) const ORDER_COLUMNS: &str = "id, status, customer_name, customer_phone, \
     customer_address, customer_city, customer_wilaya, delivery_provider, delivery_mode, \
     pickup_point_id, shipping_price, tracking_number, tracking_status, created_at, \
     confirmed_at, shipped_at, delivered_at, cancelled_at";

impl OrderRow {
    pub(crate) fn into_model(self) -> AppResult<Order> {
        Ok(Order {
            id: self.id,
            status: self
                .status
                .parse::<OrderStatus>()
                .map_err(|e| AppError::Internal(format!("Corrupt order status: {}", e)))?,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            customer_city: self.customer_city,
            customer_wilaya: self.customer_wilaya,
            delivery_provider: self
                .delivery_provider
                .parse::<DeliveryProvider>()
                .map_err(|e| AppError::Internal(format!("Corrupt delivery provider: {}", e)))?,
            delivery_mode: self
                .delivery_mode
                .parse::<DeliveryMode>()
                .map_err(|e| AppError::Internal(format!("Corrupt delivery mode: {}", e)))?,
            pickup_point_id: self.pickup_point_id,
            shipping_price: self.shipping_price,
            tracking_number: self.tracking_number,
            tracking_status: self.tracking_status,
            created_at: self.created_at,
            confirmed_at: self.confirmed_at,
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    stock_item_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
}

impl OrderItemRow {
    fn into_model(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id,
            stock_item_id: self.stock_item_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Checkout payload, persisted as a PENDING order without further
/// business validation (checkout itself lives outside this core)
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_wilaya: String,
    pub delivery_provider: DeliveryProvider,
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    pub pickup_point_id: Option<String>,
    pub shipping_price: Decimal,
    pub items: Vec<CreateOrderItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderItemInput {
    pub stock_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Lock an order row for the duration of the caller's transaction
pub(crate) async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Order> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    row.into_model()
}

/// Fetch order items inside the caller's transaction
pub(crate) async fn load_items(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, stock_item_id, quantity, unit_price
         FROM order_items WHERE order_id = $1 ORDER BY stock_item_id",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(OrderItemRow::into_model).collect())
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Persist a checkout payload as a PENDING order with its lines
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<Order> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Order must have at least one item".to_string(),
                message_fr: "La commande doit contenir au moins un article".to_string(),
            });
        }
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(AppError::InvalidQuantity(item.quantity));
            }
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (
                status, customer_name, customer_phone, customer_address, customer_city,
                customer_wilaya, delivery_provider, delivery_mode, pickup_point_id, shipping_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(shared::OrderStatus::Pending.as_str())
        .bind(&input.customer_name)
        .bind(&input.customer_phone)
        .bind(&input.customer_address)
        .bind(&input.customer_city)
        .bind(&input.customer_wilaya)
        .bind(input.delivery_provider.as_str())
        .bind(input.delivery_mode.as_str())
        .bind(&input.pickup_point_id)
        .bind(input.shipping_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, stock_item_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(row.id)
            .bind(item.stock_item_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.into_model()
    }

    /// Get an order by id
    pub async fn get(&self, order_id: Uuid) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        row.into_model()
    }

    /// Get an order's items
    pub async fn get_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, stock_item_id, quantity, unit_price
             FROM order_items WHERE order_id = $1 ORDER BY stock_item_id",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderItemRow::into_model).collect())
    }

    /// List orders, most recent first
    pub async fn list(&self) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(OrderRow::into_model).collect()
    }
}
