//! Appointment Entity

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};

use crate::lifecycle::AppointmentStatus;
use crate::scheduling::TimeSlot;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// A patient's booking with a practitioner.
///
/// Pending and confirmed appointments occupy `[start_time, end_time)` on the
/// practitioner's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub practitioner_id: String,
    pub practitioner_role: Role,
    pub specialty: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(
        patient_id: impl Into<String>,
        practitioner_id: impl Into<String>,
        practitioner_role: Role,
        specialty: impl Into<String>,
        slot: TimeSlot,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            patient_id: patient_id.into(),
            practitioner_id: practitioner_id.into(),
            practitioner_role,
            specialty: specialty.into(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            duration_minutes: slot.duration_minutes(),
            status: AppointmentStatus::Pending,
            notes: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl Entity for Appointment {
    const KIND: EntityKind = EntityKind::Appointment;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!("{} appointment on {}", self.specialty, self.slot())
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.patient_id, Role::Patient))
            .with_assignee(Recipient::new(&self.practitioner_id, self.practitioner_role))
    }
}

impl StoredEntity for Appointment {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.appointments.as_ref()
    }
}

impl Governed for Appointment {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.patient_id),
            assignee_id: Some(&self.practitioner_id),
            participant_ids: vec![],
        }
    }
}
