//! Academic Task Aggregate
//!
//! Per-student work items with progress and feedback.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::AcademicTask;
pub use repository::TaskQueries;
pub use api::tasks_router;
