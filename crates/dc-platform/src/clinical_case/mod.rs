//! Clinical Case Aggregate
//!
//! Treatment cases a student carries under professor review.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::ClinicalCase;
pub use repository::CaseQueries;
pub use api::cases_router;
