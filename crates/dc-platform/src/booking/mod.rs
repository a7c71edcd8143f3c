//! Booking
//!
//! The four-step appointment booking flow.

pub mod api;
pub mod coordinator;
pub mod flow;

pub use coordinator::{BookingCoordinator, BookingFlowRegistry};
pub use flow::{BookingFlow, BookingStep};
