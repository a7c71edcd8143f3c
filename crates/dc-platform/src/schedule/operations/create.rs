//! Create Schedule Use Case

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::schedule::entity::{DayOfWeek, Schedule, ScheduleType};
use crate::schedule::repository::ScheduleQueries;
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::{PlatformError, Result};
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleCommand {
    pub title: String,
    pub schedule_type: ScheduleType,
    pub instructor_id: String,
    pub room: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,

    #[serde(default)]
    pub specialty: Option<String>,

    #[serde(default)]
    pub semester: Option<String>,
}

/// Room or instructor already taken at an overlapping time.
pub(crate) fn clash_error(existing: &Schedule) -> PlatformError {
    PlatformError::validation(
        "SCHEDULE_CLASH",
        format!(
            "overlaps '{}' ({} {}-{} in {})",
            existing.title, existing.day_of_week, existing.start_time, existing.end_time, existing.room
        ),
    )
}

pub(crate) fn validate_times(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        return Err(PlatformError::validation(
            "INVALID_TIME_RANGE",
            format!("start {} must be before end {}", start, end),
        ));
    }
    Ok(())
}

pub struct CreateScheduleUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CreateScheduleUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: CreateScheduleCommand, ctx: ExecutionContext) -> Result<Schedule> {
        self.gate.require(&ctx.actor, Action::ManageSchedule, &Target::none())?;

        let title = command.title.trim();
        if title.is_empty() {
            return Err(PlatformError::validation("TITLE_REQUIRED", "Schedule title is required"));
        }
        let room = command.room.trim();
        if room.is_empty() {
            return Err(PlatformError::validation("ROOM_REQUIRED", "Schedule room is required"));
        }
        if command.instructor_id.trim().is_empty() {
            return Err(PlatformError::missing_field("instructorId"));
        }
        if command.capacity == 0 {
            return Err(PlatformError::validation("INVALID_CAPACITY", "capacity must be at least 1"));
        }
        validate_times(command.start_time, command.end_time)?;

        if let Some(existing) = self.store.schedules.find_clash(
            None,
            room,
            &command.instructor_id,
            command.day_of_week,
            command.start_time,
            command.end_time,
        )? {
            return Err(clash_error(&existing));
        }

        let mut schedule = Schedule::new(
            title,
            command.schedule_type,
            command.instructor_id.trim(),
            room,
            command.day_of_week,
            command.start_time,
            command.end_time,
            command.capacity,
            ctx.principal_id(),
        );
        if let Some(specialty) = &command.specialty {
            schedule = schedule.with_specialty(specialty.trim());
        }
        if let Some(semester) = &command.semester {
            schedule = schedule.with_semester(semester.trim());
        }

        let event = WorkflowEvent::created(&ctx, &schedule);
        self.unit_of_work.commit(&schedule, event)?;

        info!(schedule_id = %schedule.id, capacity = schedule.capacity, "Schedule created");
        Ok(schedule)
    }
}
