//! Appointment Aggregate
//!
//! Patient appointments with a practitioner in a time slot.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::Appointment;
pub use repository::AppointmentQueries;
pub use api::appointments_router;
