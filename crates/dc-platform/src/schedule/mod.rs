//! Schedule Aggregate
//!
//! Recurring teaching sessions with a seat limit.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::{DayOfWeek, Schedule, ScheduleType};
pub use repository::ScheduleQueries;
pub use api::schedules_router;
