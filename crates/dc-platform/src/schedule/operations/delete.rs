//! Delete Schedule Use Case

use std::sync::Arc;
use tracing::info;

use crate::scheduling::CapacityScheduler;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

pub struct DeleteScheduleUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<CapacityScheduler>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl DeleteScheduleUseCase {
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

    pub fn execute(&self, schedule_id: &str, ctx: ExecutionContext) -> Result<()> {
        let schedule = self.store.schedules.require(schedule_id)?;
        self.gate.require_on(&ctx.actor, Action::ManageSchedule, &schedule)?;

        self.scheduler.with_schedule_lock(schedule_id, || {
            let schedule = self.store.schedules.require(schedule_id)?;
            let event = WorkflowEvent::deleted(&ctx, &schedule);
            self.unit_of_work.commit_delete(&schedule, event)?;
            Ok(())
        })?;

        // Outstanding seat tokens point at nothing now
        self.scheduler.forget_schedule(schedule_id);

        info!(schedule_id, "Schedule deleted");
        Ok(())
    }
}
