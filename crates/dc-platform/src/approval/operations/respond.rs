//! Respond To Approval Request Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::approval::entity::ApprovalRequest;
use crate::lifecycle::{apply_transition, ApprovalLifecycle, ApprovalStatus, Lifecycle, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondToApprovalCommand {
    pub request_id: String,
    /// `approved` or `rejected`
    pub decision: ApprovalStatus,
    #[serde(default)]
    pub response: Option<String>,
}

pub struct RespondToApprovalUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl RespondToApprovalUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: RespondToApprovalCommand, ctx: ExecutionContext) -> Result<ApprovalRequest> {
        let payload = match command.response {
            Some(response) => TransitionPayload::response(response),
            None => TransitionPayload::none(),
        };

        let updated = self
            .store
            .locks
            .with_lock(EntityKind::ApprovalRequest, &command.request_id, || {
                let request = self.store.approvals.require(&command.request_id)?;
                self.gate
                    .require_on(&ctx.actor, Action::RespondApprovalRequest, &request)?;

                let updated =
                    apply_transition::<ApprovalLifecycle>(&request, command.decision, ctx.actor.role, &payload)?;

                let event = WorkflowEvent::transitioned(
                    &ctx,
                    &updated,
                    ApprovalLifecycle::FIELD,
                    request.status,
                    updated.status,
                );
                self.unit_of_work.commit(&updated, event)?;
                Ok(updated)
            })?;

        info!(
            request_id = %updated.id,
            status = %updated.status,
            professor_id = %ctx.actor.id,
            "Approval request answered"
        );
        Ok(updated)
    }
}
