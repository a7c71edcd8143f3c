//! Create Assignment Use Case

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::assignment::entity::Assignment;
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentCommand {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub specialty: String,
    /// Student ids the assignment targets
    pub cohort: Vec<String>,
    pub due_date: NaiveDate,

    /// Owning professor. Only honoured for admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_id: Option<String>,
}

pub struct CreateAssignmentUseCase {
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CreateAssignmentUseCase {
    pub fn new(gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { gate, unit_of_work }
    }

    pub fn execute(&self, command: CreateAssignmentCommand, ctx: ExecutionContext) -> Result<Assignment> {
        self.gate.require(&ctx.actor, Action::CreateAssignment, &Target::none())?;

        let title = command.title.trim();
        if title.is_empty() {
            return Err(PlatformError::validation("TITLE_REQUIRED", "Assignment title is required"));
        }

        // Blank ids dropped, duplicates collapsed, order kept
        let mut cohort: Vec<String> = Vec::with_capacity(command.cohort.len());
        for student in command.cohort.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !cohort.iter().any(|c| c == student) {
                cohort.push(student.to_string());
            }
        }
        if cohort.is_empty() {
            return Err(PlatformError::validation(
                "EMPTY_COHORT",
                "An assignment needs at least one student",
            ));
        }

        let professor_id = match command.professor_id {
            Some(id) if ctx.actor.is_admin() => id,
            _ => ctx.actor.id.clone(),
        };

        let mut assignment = Assignment::new(professor_id, title, command.specialty.trim(), cohort, command.due_date);
        if let Some(description) = &command.description {
            assignment = assignment.with_description(description.trim());
        }

        let event = WorkflowEvent::created(&ctx, &assignment);
        self.unit_of_work.commit(&assignment, event)?;

        info!(
            assignment_id = %assignment.id,
            cohort = assignment.cohort.len(),
            "Assignment drafted"
        );
        Ok(assignment)
    }
}
