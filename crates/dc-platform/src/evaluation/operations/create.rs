//! Create Evaluation Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::evaluation::entity::{Criterion, Evaluation};
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriterionInput {
    pub name: String,
    pub weight: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationCommand {
    pub student_id: String,
    pub title: String,
    pub criteria: Vec<CriterionInput>,
    #[serde(default)]
    pub comments: Option<String>,

    /// Evaluating professor. Only honoured for admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_id: Option<String>,
}

pub struct CreateEvaluationUseCase {
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CreateEvaluationUseCase {
    pub fn new(gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { gate, unit_of_work }
    }

    pub fn execute(&self, command: CreateEvaluationCommand, ctx: ExecutionContext) -> Result<Evaluation> {
        self.gate.require(&ctx.actor, Action::CreateEvaluation, &Target::none())?;

        if command.student_id.trim().is_empty() {
            return Err(PlatformError::missing_field("studentId"));
        }
        let title = command.title.trim();
        if title.is_empty() {
            return Err(PlatformError::validation("TITLE_REQUIRED", "Evaluation title is required"));
        }
        let criteria = build_criteria(command.criteria)?;

        let professor_id = match command.professor_id {
            Some(id) if ctx.actor.is_admin() => id,
            _ => ctx.actor.id.clone(),
        };

        let mut evaluation = Evaluation::new(command.student_id.trim(), professor_id, title, criteria);
        evaluation.comments = command
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let event = WorkflowEvent::created(&ctx, &evaluation);
        self.unit_of_work.commit(&evaluation, event)?;

        info!(
            evaluation_id = %evaluation.id,
            student_id = %evaluation.student_id,
            criteria = evaluation.criteria.len(),
            "Evaluation created"
        );
        Ok(evaluation)
    }
}

fn build_criteria(inputs: Vec<CriterionInput>) -> Result<Vec<Criterion>> {
    if inputs.is_empty() {
        return Err(PlatformError::validation(
            "CRITERIA_REQUIRED",
            "An evaluation needs at least one criterion",
        ));
    }

    let mut criteria: Vec<Criterion> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(PlatformError::validation("INVALID_CRITERION", "Criterion name is required"));
        }
        if criteria.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(PlatformError::validation(
                "DUPLICATE_CRITERION",
                format!("criterion '{}' appears twice", name),
            ));
        }
        if !(input.weight.is_finite() && input.weight > 0.0) || !(input.max_score.is_finite() && input.max_score > 0.0) {
            return Err(PlatformError::validation(
                "INVALID_CRITERION",
                format!("criterion '{}' needs a positive weight and maximum score", name),
            ));
        }
        criteria.push(Criterion::new(name, input.weight, input.max_score));
    }
    Ok(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, weight: f64, max_score: f64) -> CriterionInput {
        CriterionInput {
            name: name.into(),
            weight,
            max_score,
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = build_criteria(vec![input("Technique", 1.0, 10.0), input("technique", 2.0, 10.0)]).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_CRITERION");
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let err = build_criteria(vec![input("Technique", 0.0, 10.0)]).unwrap_err();
        assert_eq!(err.code(), "INVALID_CRITERION");
        assert!(build_criteria(vec![input("Technique", 1.0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_empty_criteria_rejected() {
        assert_eq!(build_criteria(vec![]).unwrap_err().code(), "CRITERIA_REQUIRED");
    }
}
