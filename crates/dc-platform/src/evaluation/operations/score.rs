//! Submit Evaluation Scores Use Case

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::evaluation::entity::Evaluation;
use crate::lifecycle::{apply_transition, EvaluationLifecycle, EvaluationStatus, Lifecycle, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, StoredAggregate, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    /// Criterion name, matched case-insensitively
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoresCommand {
    pub evaluation_id: String,
    pub scores: Vec<CriterionScore>,
    #[serde(default)]
    pub comments: Option<String>,
}

pub struct SubmitScoresUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl SubmitScoresUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    /// Merge scores into the evaluation. Once every criterion carries a
    /// score the evaluation completes in the same commit.
    pub fn execute(&self, command: SubmitScoresCommand, ctx: ExecutionContext) -> Result<Evaluation> {
        self.store
            .locks
            .with_lock(EntityKind::Evaluation, &command.evaluation_id, || self.record(&command, &ctx))
    }

    fn record(&self, command: &SubmitScoresCommand, ctx: &ExecutionContext) -> Result<Evaluation> {
        let evaluation = self.store.evaluations.require(&command.evaluation_id)?;
        self.gate
            .require_on(&ctx.actor, Action::SubmitEvaluationScores, &evaluation)?;

        if evaluation.status != EvaluationStatus::Pending {
            return Err(PlatformError::invalid_transition(
                EvaluationLifecycle::ENTITY,
                evaluation.status,
                EvaluationStatus::Completed,
            ));
        }

        let mut updated = evaluation.clone();
        for entry in &command.scores {
            let criterion = updated
                .criteria
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(entry.name.trim()))
                .ok_or_else(|| {
                    PlatformError::validation(
                        "UNKNOWN_CRITERION",
                        format!("'{}' is not a criterion of this evaluation", entry.name),
                    )
                })?;

            if !entry.score.is_finite() || entry.score < 0.0 || entry.score > criterion.max_score {
                return Err(PlatformError::validation(
                    "INVALID_SCORE",
                    format!(
                        "score for '{}' must be between 0 and {}",
                        criterion.name, criterion.max_score
                    ),
                ));
            }
            criterion.score = Some(entry.score);
        }

        let mut fields = vec!["criteria"];
        if let Some(comments) = command.comments.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            updated.comments = Some(comments.to_string());
            fields.push("comments");
        }
        updated.updated_at = Utc::now();

        let mut events = vec![WorkflowEvent::updated(ctx, &updated, &fields)];

        if updated.all_scored() {
            let completed = apply_transition::<EvaluationLifecycle>(
                &updated,
                EvaluationStatus::Completed,
                ctx.actor.role,
                &TransitionPayload::none(),
            )?;
            events.push(WorkflowEvent::transitioned(
                ctx,
                &completed,
                EvaluationLifecycle::FIELD,
                updated.status,
                completed.status,
            ));
            updated = completed;
        }

        self.unit_of_work
            .commit_all(&[&updated as &dyn StoredAggregate], events)?;

        info!(
            evaluation_id = %updated.id,
            status = %updated.status,
            grade = ?updated.overall_grade(),
            "Evaluation scores recorded"
        );
        Ok(updated)
    }
}
