//! Approval Request Aggregate
//!
//! Student requests to treat a patient, decided by a professor.

pub mod api;
pub mod entity;
pub mod operations;
pub mod repository;

// Re-export main types
pub use entity::ApprovalRequest;
pub use repository::ApprovalQueries;
pub use api::approvals_router;
