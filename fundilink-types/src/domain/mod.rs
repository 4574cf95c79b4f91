//! Pure domain types for the payments core.

mod attempt;
mod booking;
mod phone;

pub use attempt::{AttemptId, PaymentAttempt, PaymentConfirmation, PaymentStatus, TrackingPair};
pub use booking::{Booking, BookingId, FundiId};
pub use phone::PhoneNumber;
