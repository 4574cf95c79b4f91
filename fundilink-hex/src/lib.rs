//! # FundiLink Hex
//!
//! Application service layer and HTTP adapter for the payments service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (payment initiation and reconciliation)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `openapi/` - OpenAPI document served at `/docs`
//!
//! The service is generic over `L: PaymentLedger` and `G: StkGateway`,
//! allowing different ledger and gateway implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::{PaymentService, ReconcileOutcome};
