//! Scheduling
//!
//! Time slots, the configurable booking policy and the capacity scheduler.

pub mod policy;
pub mod scheduler;
pub mod slot;

pub use policy::BookingPolicy;
pub use scheduler::{Availability, CapacityScheduler, ReservationKind, ReservationToken, SlotRequest};
pub use slot::TimeSlot;
