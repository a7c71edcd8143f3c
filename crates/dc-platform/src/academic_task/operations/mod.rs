//! Academic Task Operations

pub mod close;
pub mod feedback;
pub mod progress;

pub use close::CloseTaskUseCase;
pub use feedback::GiveTaskFeedbackUseCase;
pub use progress::UpdateTaskProgressUseCase;
