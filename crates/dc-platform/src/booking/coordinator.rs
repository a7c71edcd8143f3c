//! Booking Coordinator
//!
//! Holds patients' booking flows and drives them step by step. Nothing is
//! reserved until confirmation, so an abandoned flow frees nothing.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::flow::{BookingFlow, BookingStep};
use crate::appointment::entity::Appointment;
use crate::appointment::operations::BookAppointmentUseCase;
use crate::directory::{Practitioner, PractitionerDirectory};
use crate::scheduling::{CapacityScheduler, TimeSlot};
use crate::shared::authorization_service::{Action, AuthorizationGate, DenyReason, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::ExecutionContext;

/// Live booking flows by id.
#[derive(Default)]
pub struct BookingFlowRegistry {
    flows: DashMap<String, BookingFlow>,
}

impl BookingFlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, flow: BookingFlow) {
        self.flows.insert(flow.id.clone(), flow);
    }

    pub fn get(&self, flow_id: &str) -> Option<BookingFlow> {
        self.flows.get(flow_id).map(|f| f.value().clone())
    }

    pub fn remove(&self, flow_id: &str) -> Option<BookingFlow> {
        self.flows.remove(flow_id).map(|(_, flow)| flow)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Run `f` on the flow with exclusive access. Concurrent calls for the
    /// same flow wait for each other.
    fn update<R>(&self, flow_id: &str, f: impl FnOnce(&mut BookingFlow) -> Result<R>) -> Result<R> {
        let mut entry = self
            .flows
            .get_mut(flow_id)
            .ok_or_else(|| PlatformError::not_found("BookingFlow", flow_id))?;
        f(entry.value_mut())
    }
}

fn require_flow_owner(flow: &BookingFlow, ctx: &ExecutionContext) -> Result<()> {
    if ctx.actor.is_admin() || flow.patient_id == ctx.actor.id {
        return Ok(());
    }
    Err(PlatformError::forbidden(
        DenyReason::NotOwner,
        format!("booking flow {} belongs to another patient", flow.id),
    ))
}

pub struct BookingCoordinator {
    registry: BookingFlowRegistry,
    gate: Arc<AuthorizationGate>,
    directory: Arc<dyn PractitionerDirectory>,
    scheduler: Arc<CapacityScheduler>,
    book: Arc<BookAppointmentUseCase>,
}

impl BookingCoordinator {
    pub fn new(
        gate: Arc<AuthorizationGate>,
        directory: Arc<dyn PractitionerDirectory>,
        scheduler: Arc<CapacityScheduler>,
        book: Arc<BookAppointmentUseCase>,
    ) -> Self {
        Self {
            registry: BookingFlowRegistry::new(),
            gate,
            directory,
            scheduler,
            book,
        }
    }

    pub fn registry(&self) -> &BookingFlowRegistry {
        &self.registry
    }

    fn with_flow<R>(
        &self,
        flow_id: &str,
        ctx: &ExecutionContext,
        f: impl FnOnce(&mut BookingFlow) -> Result<R>,
    ) -> Result<R> {
        self.registry.update(flow_id, |flow| {
            require_flow_owner(flow, ctx)?;
            f(flow)
        })
    }

    pub fn start(&self, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.gate.require(&ctx.actor, Action::BookAppointment, &Target::none())?;

        let flow = BookingFlow::new(ctx.principal_id());
        self.registry.insert(flow.clone());

        debug!(flow_id = %flow.id, patient_id = %flow.patient_id, "Booking flow started");
        Ok(flow)
    }

    pub fn get(&self, flow_id: &str, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| Ok(flow.clone()))
    }

    pub fn select_specialty(&self, flow_id: &str, specialty: &str, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| {
            flow.select_specialty(specialty, self.directory.as_ref())?;
            Ok(flow.clone())
        })
    }

    pub fn select_practitioner(
        &self,
        flow_id: &str,
        practitioner_id: &str,
        ctx: &ExecutionContext,
    ) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| {
            flow.select_practitioner(practitioner_id, self.directory.as_ref())?;
            Ok(flow.clone())
        })
    }

    pub fn select_slot(
        &self,
        flow_id: &str,
        slot: TimeSlot,
        notes: Option<String>,
        ctx: &ExecutionContext,
    ) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| {
            flow.select_slot(slot, notes)?;
            Ok(flow.clone())
        })
    }

    pub fn advance(&self, flow_id: &str, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| {
            flow.advance()?;
            Ok(flow.clone())
        })
    }

    pub fn back_to(&self, flow_id: &str, step: BookingStep, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.with_flow(flow_id, ctx, |flow| {
            flow.back_to(step)?;
            Ok(flow.clone())
        })
    }

    /// Practitioners the patient can pick for the flow's specialty.
    pub fn practitioners(&self, flow_id: &str, ctx: &ExecutionContext) -> Result<Vec<Practitioner>> {
        let flow = self.get(flow_id, ctx)?;
        let specialty = flow
            .specialty
            .ok_or_else(|| PlatformError::missing_field("specialty"))?;
        Ok(self.directory.serving(&specialty))
    }

    /// Free slots of the chosen practitioner on `date`.
    pub fn open_slots(&self, flow_id: &str, date: NaiveDate, ctx: &ExecutionContext) -> Result<Vec<TimeSlot>> {
        let flow = self.get(flow_id, ctx)?;
        let practitioner = flow
            .practitioner
            .ok_or_else(|| PlatformError::missing_field("practitionerId"))?;
        self.scheduler.open_slots(&practitioner.id, date)
    }

    /// Book the selected slot. Any booking error is returned as is and the
    /// flow stays in `Confirming`; there is no retry or alternative slot.
    /// Book the flow's selection. A finalized flow leaves the registry; the
    /// caller gets it back along with the appointment.
    pub fn confirm(&self, flow_id: &str, ctx: &ExecutionContext) -> Result<(BookingFlow, Appointment)> {
        let confirmed = self.with_flow(flow_id, ctx, |flow| {
            let command = flow.booking_command()?;
            let appointment = self.book.execute(command, ctx.clone())?;

            flow.finalize(&appointment.id);
            info!(flow_id = %flow.id, appointment_id = %appointment.id, "Booking flow finalized");
            Ok((flow.clone(), appointment))
        })?;
        self.registry.remove(flow_id);
        Ok(confirmed)
    }

    /// Drop the flow. Nothing was reserved, so nothing is released.
    pub fn abandon(&self, flow_id: &str, ctx: &ExecutionContext) -> Result<()> {
        self.with_flow(flow_id, ctx, |_| Ok(()))?;
        self.registry.remove(flow_id);
        debug!(flow_id, "Booking flow abandoned");
        Ok(())
    }
}
