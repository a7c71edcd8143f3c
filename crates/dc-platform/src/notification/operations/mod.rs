//! Notification Operations

pub mod inbox;

pub use inbox::{NotificationFilter, NotificationInboxUseCase};
