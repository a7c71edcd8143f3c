//! Book Appointment Use Case

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::appointment::entity::Appointment;
use crate::directory::PractitionerDirectory;
use crate::scheduling::{CapacityScheduler, SlotRequest, TimeSlot};
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::ExecutionContext;

/// Command for booking an appointment with a practitioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentCommand {
    pub specialty: String,
    pub practitioner_id: String,
    pub slot: TimeSlot,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Patient to book for. Only honoured for admins; patients always book
    /// for themselves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

pub struct BookAppointmentUseCase {
    gate: Arc<AuthorizationGate>,
    directory: Arc<dyn PractitionerDirectory>,
    scheduler: Arc<CapacityScheduler>,
}

impl BookAppointmentUseCase {
    pub fn new(
        gate: Arc<AuthorizationGate>,
        directory: Arc<dyn PractitionerDirectory>,
        scheduler: Arc<CapacityScheduler>,
    ) -> Self {
        Self {
            gate,
            directory,
            scheduler,
        }
    }

    pub fn execute(&self, command: BookAppointmentCommand, ctx: ExecutionContext) -> Result<Appointment> {
        self.gate.require(&ctx.actor, Action::BookAppointment, &Target::none())?;

        let specialty = command.specialty.trim();
        if specialty.is_empty() {
            return Err(PlatformError::validation("SPECIALTY_REQUIRED", "A specialty is required"));
        }

        let practitioner = self
            .directory
            .require_serving(&command.practitioner_id, specialty)?;

        let notes = command
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(notes) = &notes {
            let max = self.scheduler.policy().max_notes_len;
            if notes.chars().count() > max {
                return Err(PlatformError::validation(
                    "NOTES_TOO_LONG",
                    format!("Notes are limited to {} characters", max),
                ));
            }
        }

        let patient_id = match command.patient_id {
            Some(id) if ctx.actor.is_admin() => id,
            _ => ctx.actor.id.clone(),
        };

        let request = SlotRequest {
            patient_id,
            practitioner_id: practitioner.id,
            practitioner_role: practitioner.role,
            specialty: specialty.to_string(),
            slot: command.slot,
            notes,
        };

        let (_token, appointment) = self.scheduler.reserve_slot(&ctx, request)?;

        info!(
            appointment_id = %appointment.id,
            patient_id = %appointment.patient_id,
            practitioner_id = %appointment.practitioner_id,
            "Appointment booked"
        );
        Ok(appointment)
    }
}
