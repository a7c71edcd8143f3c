//! Open Clinical Case Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::clinical_case::entity::ClinicalCase;
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCaseCommand {
    pub patient_id: String,
    /// Supervising professor
    pub professor_id: String,
    pub treatment: String,
    pub specialty: String,
    pub total_sessions: u32,

    /// Student to open the case for. Only honoured for admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

pub struct OpenCaseUseCase {
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl OpenCaseUseCase {
    pub fn new(gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { gate, unit_of_work }
    }

    pub fn execute(&self, command: OpenCaseCommand, ctx: ExecutionContext) -> Result<ClinicalCase> {
        self.gate.require(&ctx.actor, Action::OpenClinicalCase, &Target::none())?;

        if command.patient_id.trim().is_empty() {
            return Err(PlatformError::missing_field("patientId"));
        }
        if command.professor_id.trim().is_empty() {
            return Err(PlatformError::missing_field("professorId"));
        }
        let treatment = command.treatment.trim();
        if treatment.is_empty() {
            return Err(PlatformError::validation("TREATMENT_REQUIRED", "A treatment is required"));
        }
        if command.total_sessions == 0 {
            return Err(PlatformError::validation(
                "INVALID_SESSIONS",
                "a case needs at least one session",
            ));
        }

        let student_id = match command.student_id {
            Some(id) if ctx.actor.is_admin() => id,
            _ => ctx.actor.id.clone(),
        };

        let case = ClinicalCase::new(
            command.patient_id.trim(),
            student_id,
            command.professor_id.trim(),
            treatment,
            command.specialty.trim(),
            command.total_sessions,
        );

        let event = WorkflowEvent::created(&ctx, &case);
        self.unit_of_work.commit(&case, event)?;

        info!(case_id = %case.id, student_id = %case.student_id, "Clinical case opened");
        Ok(case)
    }
}
