//! # FundiLink Types
//!
//! Domain types and port traits for the FundiLink payments service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (PhoneNumber, PaymentAttempt, Booking)
//! - `callback/` - The gateway's asynchronous result envelope
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod callback;
pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use callback::{CallbackMetadata, MetadataItem, StkCallback, StkCallbackEnvelope};
pub use domain::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentConfirmation, PaymentStatus,
    PhoneNumber, TrackingPair,
};
pub use dto::*;
pub use error::{AppError, DomainError, GatewayError, RepoError};
pub use ports::{PaymentLedger, StkGateway, StkPushRequest};
