//! Give Task Feedback Use Case

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::academic_task::entity::AcademicTask;
use crate::lifecycle::TaskStatus;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

pub struct GiveTaskFeedbackUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl GiveTaskFeedbackUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, task_id: &str, feedback: &str, ctx: ExecutionContext) -> Result<AcademicTask> {
        self.store
            .locks
            .with_lock(EntityKind::AcademicTask, task_id, || self.give(task_id, feedback, &ctx))
    }

    fn give(&self, task_id: &str, feedback: &str, ctx: &ExecutionContext) -> Result<AcademicTask> {
        let task = self.store.tasks.require(task_id)?;
        self.gate.require_on(&ctx.actor, Action::GiveTaskFeedback, &task)?;

        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(PlatformError::missing_field("feedback"));
        }
        if task.status == TaskStatus::Pending {
            return Err(PlatformError::validation(
                "TASK_NOT_STARTED",
                "feedback can only be given once the student has started the task",
            ));
        }

        let mut updated = task;
        updated.feedback = Some(feedback.to_string());
        updated.updated_at = Utc::now();

        let event = WorkflowEvent::updated(ctx, &updated, &["feedback"]);
        self.unit_of_work.commit(&updated, event)?;

        info!(task_id = %updated.id, "Task feedback given");
        Ok(updated)
    }
}
