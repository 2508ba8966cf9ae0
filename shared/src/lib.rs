//! Shared types and models for the Atelier Commerce Platform
//!
//! This crate contains the domain models and pure fulfillment logic shared
//! between the backend services and their tests: the inventory ledger
//! arithmetic, the order state machine, and carrier-facing shipment types.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
