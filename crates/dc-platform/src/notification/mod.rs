//! Notification Aggregate
//!
//! Per-recipient messages derived from workflow events.

pub mod api;
pub mod entity;
pub mod emitter;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::{Notification, NotificationType, Priority};
pub use emitter::NotificationEmitter;
pub use repository::NotificationQueries;
pub use api::notifications_router;
