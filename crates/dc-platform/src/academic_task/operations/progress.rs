//! Update Task Progress Use Case

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::academic_task::entity::AcademicTask;
use crate::lifecycle::{apply_transition, Lifecycle, TaskLifecycle, TaskStatus, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, StoredAggregate, UnitOfWork, WorkflowEvent};

pub struct UpdateTaskProgressUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl UpdateTaskProgressUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    /// Record progress. A pending task moves to in-progress as soon as any
    /// progress is reported; reaching 100 completes it. Progress only moves
    /// forward.
    pub fn execute(&self, task_id: &str, progress: u8, ctx: ExecutionContext) -> Result<AcademicTask> {
        self.store
            .locks
            .with_lock(EntityKind::AcademicTask, task_id, || self.record(task_id, progress, &ctx))
    }

    fn record(&self, task_id: &str, progress: u8, ctx: &ExecutionContext) -> Result<AcademicTask> {
        let task = self.store.tasks.require(task_id)?;
        self.gate.require_on(&ctx.actor, Action::UpdateTaskProgress, &task)?;

        if progress > 100 {
            return Err(PlatformError::validation(
                "INVALID_PROGRESS",
                "progress must be between 0 and 100",
            ));
        }
        if matches!(task.status, TaskStatus::Completed | TaskStatus::Closed) {
            return Err(PlatformError::validation(
                "TASK_FINISHED",
                format!("task is already {}", task.status),
            ));
        }
        if progress < task.progress {
            return Err(PlatformError::validation(
                "PROGRESS_REGRESSION",
                format!("progress cannot drop from {} to {}", task.progress, progress),
            ));
        }

        let mut updated = task.clone();
        let mut events = Vec::new();

        if updated.status == TaskStatus::Pending && progress > 0 {
            let started = apply_transition::<TaskLifecycle>(
                &updated,
                TaskStatus::InProgress,
                ctx.actor.role,
                &TransitionPayload::none(),
            )?;
            events.push(WorkflowEvent::transitioned(
                ctx,
                &started,
                TaskLifecycle::FIELD,
                updated.status,
                started.status,
            ));
            updated = started;
        }

        updated.progress = progress;
        updated.updated_at = Utc::now();

        if progress == 100 {
            let completed = apply_transition::<TaskLifecycle>(
                &updated,
                TaskStatus::Completed,
                ctx.actor.role,
                &TransitionPayload::none(),
            )?;
            events.push(WorkflowEvent::transitioned(
                ctx,
                &completed,
                TaskLifecycle::FIELD,
                updated.status,
                completed.status,
            ));
            updated = completed;
        }

        if events.is_empty() {
            if progress == task.progress {
                return Ok(task);
            }
            events.push(WorkflowEvent::updated(ctx, &updated, &["progress"]));
        }

        self.unit_of_work
            .commit_all(&[&updated as &dyn StoredAggregate], events)?;

        info!(
            task_id = %updated.id,
            status = %updated.status,
            progress = updated.progress,
            "Task progress updated"
        );
        Ok(updated)
    }
}
