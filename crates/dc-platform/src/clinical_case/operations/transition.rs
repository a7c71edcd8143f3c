//! Clinical Case Status Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::clinical_case::entity::ClinicalCase;
use crate::lifecycle::{apply_transition, CaseStatus, CaseStatusLifecycle, Lifecycle, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCaseCommand {
    pub case_id: String,
    pub target: CaseStatus,
    /// Required when cancelling
    #[serde(default)]
    pub reason: Option<String>,
}

pub struct TransitionCaseUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl TransitionCaseUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: TransitionCaseCommand, ctx: ExecutionContext) -> Result<ClinicalCase> {
        let payload = match command.reason {
            Some(reason) => TransitionPayload::reason(reason),
            None => TransitionPayload::none(),
        };

        let updated = self.store.locks.with_lock(EntityKind::ClinicalCase, &command.case_id, || {
            let case = self.store.cases.require(&command.case_id)?;
            self.gate
                .require_on(&ctx.actor, Action::TransitionClinicalCase, &case)?;

            let updated = apply_transition::<CaseStatusLifecycle>(&case, command.target, ctx.actor.role, &payload)?;

            let event = WorkflowEvent::transitioned(
                &ctx,
                &updated,
                CaseStatusLifecycle::FIELD,
                case.status,
                updated.status,
            );
            self.unit_of_work.commit(&updated, event)?;
            Ok(updated)
        })?;

        info!(case_id = %updated.id, status = %updated.status, "Case status changed");
        Ok(updated)
    }
}
