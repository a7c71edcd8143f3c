//! Clinical Case Operations

pub mod open;
pub mod progress;
pub mod review;
pub mod transition;

pub use open::{OpenCaseCommand, OpenCaseUseCase};
pub use progress::{RecordCaseProgressCommand, RecordCaseProgressUseCase};
pub use review::{ReviewCaseCommand, ReviewCaseUseCase};
pub use transition::{TransitionCaseCommand, TransitionCaseUseCase};
