//! Assignment Aggregate
//!
//! Professor-authored work that fans out into academic tasks on publish.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::Assignment;
pub use repository::AssignmentQueries;
pub use api::assignments_router;
