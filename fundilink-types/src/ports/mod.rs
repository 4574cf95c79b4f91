//! Port traits that adapters must implement.

mod gateway;
mod ledger;

pub use gateway::{StkGateway, StkPushRequest};
pub use ledger::PaymentLedger;
