//! Approval Request Operations

pub mod respond;
pub mod submit;

pub use respond::{RespondToApprovalCommand, RespondToApprovalUseCase};
pub use submit::{SubmitApprovalRequestCommand, SubmitApprovalRequestUseCase};
