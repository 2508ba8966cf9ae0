//! Domain models for the Atelier Commerce Platform

mod ledger;
mod order;
mod shipment;
mod stock;

pub use ledger::*;
pub use order::*;
pub use shipment::*;
pub use stock::*;
