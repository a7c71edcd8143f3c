//! Set Schedule Status Use Case

use std::sync::Arc;
use tracing::info;

use crate::lifecycle::{apply_transition, Lifecycle, ScheduleLifecycle, ScheduleStatus, TransitionPayload};
use crate::schedule::entity::Schedule;
use crate::scheduling::CapacityScheduler;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

pub struct SetScheduleStatusUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<CapacityScheduler>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl SetScheduleStatusUseCase {
    pub fn new(
        store: Arc<EntityStore>,
        gate: Arc<AuthorizationGate>,
        scheduler: Arc<CapacityScheduler>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            store,
            gate,
            scheduler,
            unit_of_work,
        }
    }

    pub fn execute(&self, schedule_id: &str, target: ScheduleStatus, ctx: ExecutionContext) -> Result<Schedule> {
        let schedule = self.store.schedules.require(schedule_id)?;
        self.gate.require_on(&ctx.actor, Action::ManageSchedule, &schedule)?;

        let updated = self.scheduler.with_schedule_lock(schedule_id, || {
            let current = self.store.schedules.require(schedule_id)?;
            let updated =
                apply_transition::<ScheduleLifecycle>(&current, target, ctx.actor.role, &TransitionPayload::none())?;

            let event = WorkflowEvent::transitioned(
                &ctx,
                &updated,
                ScheduleLifecycle::FIELD,
                current.status,
                updated.status,
            );
            self.unit_of_work.commit(&updated, event)?;
            Ok(updated)
        })?;

        info!(schedule_id, status = %updated.status, "Schedule status changed");
        Ok(updated)
    }
}
