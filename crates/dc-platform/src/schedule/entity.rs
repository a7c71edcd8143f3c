//! Schedule Entity
//!
//! Recurring weekly sessions (classes, clinics, labs, exams) with a seat limit.

use chrono::{DateTime, NaiveTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::lifecycle::ScheduleStatus;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Class,
    Clinic,
    Lab,
    Exam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub title: String,
    pub schedule_type: ScheduleType,
    pub instructor_id: String,
    pub room: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub specialty: String,
    pub semester: String,

    /// Seat limit, at least 1
    pub capacity: u32,
    /// Seats taken; written only by the capacity scheduler
    pub enrolled: u32,

    pub status: ScheduleStatus,

    /// Admin who created the schedule
    pub created_by: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        schedule_type: ScheduleType,
        instructor_id: impl Into<String>,
        room: impl Into<String>,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
        capacity: u32,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            title: title.into(),
            schedule_type,
            instructor_id: instructor_id.into(),
            room: room.into(),
            day_of_week,
            start_time,
            end_time,
            specialty: String::new(),
            semester: String::new(),
            capacity,
            enrolled: 0,
            status: ScheduleStatus::Active,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = specialty.into();
        self
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }

    pub fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }

    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }
}

impl Entity for Schedule {
    const KIND: EntityKind = EntityKind::Schedule;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!(
            "{} ({} {}-{}, room {})",
            self.title,
            self.day_of_week,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            self.room
        )
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.created_by, Role::Admin))
            .with_assignee(Recipient::new(&self.instructor_id, Role::Professor))
    }
}

impl StoredEntity for Schedule {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.schedules.as_ref()
    }
}

impl Governed for Schedule {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.created_by),
            assignee_id: Some(&self.instructor_id),
            participant_ids: vec![],
        }
    }
}
