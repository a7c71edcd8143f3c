//! Enrollment Use Cases
//!
//! Seat reservations on a schedule and the release of any reservation token.

use std::sync::Arc;
use tracing::info;

use crate::scheduling::{Availability, CapacityScheduler, ReservationToken};
use crate::shared::authorization_service::{Action, AuthorizationGate, DenyReason, Target};
use crate::shared::error::{PlatformError, Result};
use crate::usecase::ExecutionContext;

pub struct EnrollInScheduleUseCase {
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<CapacityScheduler>,
}

impl EnrollInScheduleUseCase {
    pub fn new(gate: Arc<AuthorizationGate>, scheduler: Arc<CapacityScheduler>) -> Self {
        Self { gate, scheduler }
    }

    /// Reserve a seat for the caller, or for `student_id` when an admin
    /// enrolls someone else.
    pub fn execute(
        &self,
        schedule_id: &str,
        student_id: Option<&str>,
        ctx: ExecutionContext,
    ) -> Result<ReservationToken> {
        self.gate.require(&ctx.actor, Action::EnrollSchedule, &Target::none())?;

        let requester = match student_id {
            Some(id) if ctx.actor.is_admin() => id.to_string(),
            _ => ctx.actor.id.clone(),
        };

        self.scheduler.reserve_seat(&ctx, schedule_id, &requester)
    }

    pub fn availability(&self, schedule_id: &str, ctx: &ExecutionContext) -> Result<Availability> {
        self.gate.require(&ctx.actor, Action::ReadSchedule, &Target::none())?;
        self.scheduler.check_availability(schedule_id)
    }
}

pub struct ReleaseReservationUseCase {
    scheduler: Arc<CapacityScheduler>,
}

impl ReleaseReservationUseCase {
    pub fn new(scheduler: Arc<CapacityScheduler>) -> Self {
        Self { scheduler }
    }

    /// Release a seat or slot token. Only the holder (or an admin) may
    /// release it; an unknown or already released token is a no-op.
    pub fn execute(&self, token_id: &str, ctx: ExecutionContext) -> Result<bool> {
        let Some(token) = self.scheduler.token(token_id) else {
            return Ok(false);
        };

        if !ctx.actor.is_admin() && token.holder_id() != ctx.actor.id {
            return Err(PlatformError::forbidden(
                DenyReason::NotOwner,
                "only the holder may release a reservation",
            ));
        }

        let released = self.scheduler.release(&ctx, token_id)?;
        if released {
            info!(token_id, actor = %ctx.actor, "Reservation released");
        }
        Ok(released)
    }
}
