//! Close Task Use Case

use std::sync::Arc;
use tracing::info;

use crate::academic_task::entity::AcademicTask;
use crate::lifecycle::{apply_transition, Lifecycle, TaskLifecycle, TaskStatus, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

pub struct CloseTaskUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CloseTaskUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, task_id: &str, ctx: ExecutionContext) -> Result<AcademicTask> {
        let closed = self.store.locks.with_lock(EntityKind::AcademicTask, task_id, || {
            let task = self.store.tasks.require(task_id)?;
            self.gate.require_on(&ctx.actor, Action::CloseAcademicTask, &task)?;

            let closed =
                apply_transition::<TaskLifecycle>(&task, TaskStatus::Closed, ctx.actor.role, &TransitionPayload::none())?;

            let event = WorkflowEvent::transitioned(&ctx, &closed, TaskLifecycle::FIELD, task.status, closed.status);
            self.unit_of_work.commit(&closed, event)?;
            Ok(closed)
        })?;

        info!(task_id = %closed.id, "Task closed");
        Ok(closed)
    }
}
