//! Assignment Operations

pub mod create;
pub mod publish;

pub use create::{CreateAssignmentCommand, CreateAssignmentUseCase};
pub use publish::PublishAssignmentUseCase;
