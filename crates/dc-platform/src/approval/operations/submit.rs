//! Submit Approval Request Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::approval::entity::ApprovalRequest;
use crate::approval::repository::ApprovalQueries;
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

/// A student's request for a professor's go-ahead to treat a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApprovalRequestCommand {
    pub patient_id: String,
    /// Professor who will decide
    pub professor_id: String,
    pub specialty: String,
    pub description: String,

    /// Opaque file references
    #[serde(default)]
    pub attachments: Vec<String>,

    /// Student to submit for. Only honoured for admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

pub struct SubmitApprovalRequestUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl SubmitApprovalRequestUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: SubmitApprovalRequestCommand, ctx: ExecutionContext) -> Result<ApprovalRequest> {
        self.gate
            .require(&ctx.actor, Action::SubmitApprovalRequest, &Target::none())?;

        let patient_id = command.patient_id.trim();
        if patient_id.is_empty() {
            return Err(PlatformError::missing_field("patientId"));
        }
        let professor_id = command.professor_id.trim();
        if professor_id.is_empty() {
            return Err(PlatformError::missing_field("professorId"));
        }
        let specialty = command.specialty.trim();
        if specialty.is_empty() {
            return Err(PlatformError::validation("SPECIALTY_REQUIRED", "A specialty is required"));
        }
        let description = command.description.trim();
        if description.is_empty() {
            return Err(PlatformError::validation(
                "DESCRIPTION_REQUIRED",
                "Describe the proposed treatment",
            ));
        }

        let student_id = match command.student_id {
            Some(id) if ctx.actor.is_admin() => id,
            _ => ctx.actor.id.clone(),
        };

        let key = format!("{}/{}/{}", student_id, patient_id, specialty.to_lowercase());
        let request = self.store.locks.with_lock(EntityKind::ApprovalRequest, &key, || {
            if let Some(open) = self
                .store
                .approvals
                .find_open_duplicate(&student_id, patient_id, specialty)?
            {
                return Err(PlatformError::validation(
                    "DUPLICATE_PENDING_REQUEST",
                    format!("request {} for this patient and specialty is still pending", open.id),
                ));
            }

            let request = ApprovalRequest::new(&student_id, patient_id, professor_id, specialty, description)
                .with_attachments(command.attachments);

            let event = WorkflowEvent::created(&ctx, &request);
            self.unit_of_work.commit(&request, event)?;
            Ok(request)
        })?;

        info!(
            request_id = %request.id,
            student_id = %request.student_id,
            professor_id = %request.professor_id,
            "Approval request submitted"
        );
        Ok(request)
    }
}
