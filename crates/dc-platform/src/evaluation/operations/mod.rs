//! Evaluation Operations

pub mod create;
pub mod score;

pub use create::{CreateEvaluationCommand, CreateEvaluationUseCase, CriterionInput};
pub use score::{CriterionScore, SubmitScoresCommand, SubmitScoresUseCase};
