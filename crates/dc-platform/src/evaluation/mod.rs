//! Evaluation Aggregate
//!
//! Weighted-criteria assessments of a student.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::{Criterion, Evaluation};
pub use repository::EvaluationQueries;
pub use api::evaluations_router;
