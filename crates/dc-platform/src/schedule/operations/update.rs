//! Update Schedule Use Case

use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::create::{clash_error, validate_times};
use crate::schedule::entity::{DayOfWeek, Schedule};
use crate::schedule::repository::ScheduleQueries;
use crate::scheduling::CapacityScheduler;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleCommand {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
}

pub struct UpdateScheduleUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<CapacityScheduler>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl UpdateScheduleUseCase {
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

    pub fn execute(&self, schedule_id: &str, command: UpdateScheduleCommand, ctx: ExecutionContext) -> Result<Schedule> {
        let existing = self.store.schedules.require(schedule_id)?;
        self.gate.require_on(&ctx.actor, Action::ManageSchedule, &existing)?;

        // Capacity is checked against `enrolled`, so the whole update runs
        // under the schedule's seat lock.
        self.scheduler.with_schedule_lock(schedule_id, || {
            let mut schedule = self.store.schedules.require(schedule_id)?;
            let mut changed: Vec<&str> = Vec::new();

            if let Some(title) = command.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                if title != schedule.title {
                    schedule.title = title.to_string();
                    changed.push("title");
                }
            }
            if let Some(instructor) = command.instructor_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                if instructor != schedule.instructor_id {
                    schedule.instructor_id = instructor.to_string();
                    changed.push("instructorId");
                }
            }
            if let Some(room) = command.room.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                if room != schedule.room {
                    schedule.room = room.to_string();
                    changed.push("room");
                }
            }
            if let Some(day) = command.day_of_week.filter(|d| *d != schedule.day_of_week) {
                schedule.day_of_week = day;
                changed.push("dayOfWeek");
            }
            if let Some(start) = command.start_time.filter(|t| *t != schedule.start_time) {
                schedule.start_time = start;
                changed.push("startTime");
            }
            if let Some(end) = command.end_time.filter(|t| *t != schedule.end_time) {
                schedule.end_time = end;
                changed.push("endTime");
            }
            if let Some(specialty) = &command.specialty {
                schedule.specialty = specialty.trim().to_string();
                changed.push("specialty");
            }
            if let Some(semester) = &command.semester {
                schedule.semester = semester.trim().to_string();
                changed.push("semester");
            }
            if let Some(capacity) = command.capacity.filter(|c| *c != schedule.capacity) {
                CapacityScheduler::check_resize(&schedule, capacity)?;
                schedule.capacity = capacity;
                changed.push("capacity");
            }

            if changed.is_empty() {
                return Ok(schedule);
            }

            validate_times(schedule.start_time, schedule.end_time)?;
            if let Some(clash) = self.store.schedules.find_clash(
                Some(&schedule.id),
                &schedule.room,
                &schedule.instructor_id,
                schedule.day_of_week,
                schedule.start_time,
                schedule.end_time,
            )? {
                return Err(clash_error(&clash));
            }

            schedule.updated_at = Utc::now();
            let event = WorkflowEvent::updated(&ctx, &schedule, &changed);
            self.unit_of_work.commit(&schedule, event)?;

            info!(schedule_id = %schedule.id, fields = ?changed, "Schedule updated");
            Ok(schedule)
        })
    }
}
