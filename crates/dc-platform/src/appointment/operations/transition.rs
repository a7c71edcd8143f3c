//! Confirm / Complete / Cancel Appointment Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::appointment::entity::Appointment;
use crate::lifecycle::{apply_transition, AppointmentLifecycle, AppointmentStatus, Lifecycle, TransitionPayload};
use crate::scheduling::CapacityScheduler;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionAppointmentCommand {
    pub appointment_id: String,
    pub target: AppointmentStatus,

    /// Cancellation reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionAppointmentCommand {
    pub fn confirm(appointment_id: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            target: AppointmentStatus::Confirmed,
            reason: None,
        }
    }

    pub fn complete(appointment_id: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            target: AppointmentStatus::Completed,
            reason: None,
        }
    }

    pub fn cancel(appointment_id: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            target: AppointmentStatus::Cancelled,
            reason,
        }
    }
}

fn action_for(target: AppointmentStatus) -> Action {
    match target {
        AppointmentStatus::Cancelled => Action::CancelAppointment,
        AppointmentStatus::Completed => Action::CompleteAppointment,
        AppointmentStatus::Pending | AppointmentStatus::Confirmed => Action::ConfirmAppointment,
    }
}

pub struct TransitionAppointmentUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<CapacityScheduler>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl TransitionAppointmentUseCase {
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

    pub fn execute(&self, command: TransitionAppointmentCommand, ctx: ExecutionContext) -> Result<Appointment> {
        let appointment = self.store.appointments.require(&command.appointment_id)?;
        self.gate
            .require_on(&ctx.actor, action_for(command.target), &appointment)?;

        let payload = match command.reason {
            Some(reason) => TransitionPayload::reason(reason),
            None => TransitionPayload::none(),
        };

        // Occupancy changes on cancel, so the move runs under the
        // practitioner's slot lock and re-reads the record there.
        let updated = self
            .scheduler
            .with_practitioner_lock(&appointment.practitioner_id, || {
                let current = self.store.appointments.require(&appointment.id)?;
                let updated = apply_transition::<AppointmentLifecycle>(
                    &current,
                    command.target,
                    ctx.actor.role,
                    &payload,
                )?;

                let event = WorkflowEvent::transitioned(
                    &ctx,
                    &updated,
                    AppointmentLifecycle::FIELD,
                    current.status,
                    updated.status,
                );
                self.unit_of_work.commit(&updated, event)?;
                Ok(updated)
            })?;

        if updated.status == AppointmentStatus::Cancelled {
            self.scheduler.forget_slot(&updated.id);
        }

        info!(
            appointment_id = %updated.id,
            status = %updated.status,
            actor = %ctx.actor,
            "Appointment transitioned"
        );
        Ok(updated)
    }
}
