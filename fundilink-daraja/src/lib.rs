//! # FundiLink Daraja
//!
//! Outbound adapter for the Safaricom Daraja API (M-Pesa STK Push).
//!
//! ## Architecture
//!
//! - `auth` - OAuth credential cache (short-lived bearer tokens)
//! - `signer` - time-bound transaction password and timestamp formatting
//! - `client` - the HTTP gateway implementing the `StkGateway` port
//!
//! The adapter owns all Daraja wire formats; the rest of the system only
//! sees the domain-level `StkPushRequest` / `TrackingPair` types.

pub mod auth;
pub mod client;
pub mod signer;

pub use auth::{Authorize, Credentials, OAuthClient, TokenCache};
pub use client::{DarajaConfig, DarajaGateway};
