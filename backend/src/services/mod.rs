//! Business logic services for the order fulfillment backend

pub mod fulfillment;
pub mod ledger;
pub mod orders;
pub mod reservation;
pub mod tracking;

pub use fulfillment::FulfillmentService;
pub use ledger::LedgerService;
pub use orders::OrderService;
pub use tracking::TrackingService;
