//! Review / Resubmit Clinical Case Use Cases

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::clinical_case::entity::ClinicalCase;
use crate::lifecycle::{apply_transition, CaseApprovalLifecycle, CaseApprovalStatus, Lifecycle, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCaseCommand {
    pub case_id: String,
    /// `approved`, `rejected` or `revision-needed`
    pub outcome: CaseApprovalStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct ReviewCaseUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl ReviewCaseUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: ReviewCaseCommand, ctx: ExecutionContext) -> Result<ClinicalCase> {
        let payload = match command.notes {
            Some(notes) => TransitionPayload::notes(notes),
            None => TransitionPayload::none(),
        };

        self.store.locks.with_lock(EntityKind::ClinicalCase, &command.case_id, || {
            let case = self.store.cases.require(&command.case_id)?;
            self.gate.require_on(&ctx.actor, Action::ReviewClinicalCase, &case)?;
            move_review(&self.unit_of_work, &case, command.outcome, &payload, &ctx)
        })
    }

    /// Send a case back for review after revisions.
    pub fn resubmit(&self, case_id: &str, ctx: ExecutionContext) -> Result<ClinicalCase> {
        self.store.locks.with_lock(EntityKind::ClinicalCase, case_id, || {
            let case = self.store.cases.require(case_id)?;
            self.gate.require_on(&ctx.actor, Action::ResubmitClinicalCase, &case)?;

            move_review(
                &self.unit_of_work,
                &case,
                CaseApprovalStatus::Pending,
                &TransitionPayload::none(),
                &ctx,
            )
        })
    }
}

fn move_review(
    unit_of_work: &Arc<dyn UnitOfWork>,
    case: &ClinicalCase,
    target: CaseApprovalStatus,
    payload: &TransitionPayload,
    ctx: &ExecutionContext,
) -> Result<ClinicalCase> {
    let updated = apply_transition::<CaseApprovalLifecycle>(case, target, ctx.actor.role, payload)?;

    let event = WorkflowEvent::transitioned(
        ctx,
        &updated,
        CaseApprovalLifecycle::FIELD,
        case.approval_status,
        updated.approval_status,
    );
    unit_of_work.commit(&updated, event)?;

    info!(
        case_id = %updated.id,
        approval_status = %updated.approval_status,
        actor = %ctx.actor,
        "Case review status changed"
    );
    Ok(updated)
}
