//! HTTP request handlers

pub mod health;
pub mod orders;
pub mod stock;

pub use health::health_check;
pub use orders::{
    cancel_order, cancel_reservation, create_order, deliver_order, get_order, list_orders,
    reserve_order, ship_order, sync_tracking, update_order_status,
};
pub use stock::{
    create_stock_item, get_stock_item, list_stock_items, list_transactions, low_stock,
    record_transaction,
};
