//! Booking flow state
//!
//! A patient walks specialty -> practitioner -> slot -> confirmation. Each
//! step owns one selection; going back keeps the selections up to and
//! including the step returned to and drops the rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::appointment::operations::BookAppointmentCommand;
use crate::directory::{Practitioner, PractitionerDirectory};
use crate::scheduling::TimeSlot;
use crate::shared::error::{PlatformError, Result};
use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStep {
    SelectingSpecialty,
    SelectingPractitioner,
    SelectingSlot,
    Confirming,
    Finalized,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::SelectingSpecialty => "selecting-specialty",
            BookingStep::SelectingPractitioner => "selecting-practitioner",
            BookingStep::SelectingSlot => "selecting-slot",
            BookingStep::Confirming => "confirming",
            BookingStep::Finalized => "finalized",
        }
    }

    fn next(&self) -> Option<BookingStep> {
        match self {
            BookingStep::SelectingSpecialty => Some(BookingStep::SelectingPractitioner),
            BookingStep::SelectingPractitioner => Some(BookingStep::SelectingSlot),
            BookingStep::SelectingSlot => Some(BookingStep::Confirming),
            BookingStep::Confirming => Some(BookingStep::Finalized),
            BookingStep::Finalized => None,
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingFlow {
    pub id: String,
    pub patient_id: String,
    pub step: BookingStep,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practitioner: Option<Practitioner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Set once the flow is finalized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,

    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingFlow {
    pub fn new(patient_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            patient_id: patient_id.into(),
            step: BookingStep::SelectingSpecialty,
            specialty: None,
            practitioner: None,
            slot: None,
            notes: None,
            appointment_id: None,
            started_at: now,
            updated_at: now,
        }
    }

    fn expect_step(&self, expected: BookingStep) -> Result<()> {
        if self.step != expected {
            return Err(PlatformError::invalid_transition(
                "BookingFlow",
                self.step,
                expected.next().unwrap_or(expected),
            ));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn select_specialty(&mut self, specialty: &str, directory: &dyn PractitionerDirectory) -> Result<()> {
        self.expect_step(BookingStep::SelectingSpecialty)?;

        let specialty = specialty.trim();
        if specialty.is_empty() {
            return Err(PlatformError::missing_field("specialty"));
        }
        if directory.serving(specialty).is_empty() {
            return Err(PlatformError::validation(
                "SPECIALTY_NOT_OFFERED",
                format!("no practitioner offers {}", specialty),
            ));
        }

        self.specialty = Some(specialty.to_string());
        self.step = BookingStep::SelectingPractitioner;
        self.touch();
        Ok(())
    }

    pub fn select_practitioner(&mut self, practitioner_id: &str, directory: &dyn PractitionerDirectory) -> Result<()> {
        self.expect_step(BookingStep::SelectingPractitioner)?;

        let specialty = self
            .specialty
            .as_deref()
            .ok_or_else(|| PlatformError::missing_field("specialty"))?;
        let practitioner = directory.require_serving(practitioner_id, specialty)?;

        self.practitioner = Some(practitioner);
        self.step = BookingStep::SelectingSlot;
        self.touch();
        Ok(())
    }

    /// Pick a slot. Occupancy is only checked at confirmation.
    pub fn select_slot(&mut self, slot: TimeSlot, notes: Option<String>) -> Result<()> {
        self.expect_step(BookingStep::SelectingSlot)?;

        let slot = slot.validated()?;
        self.slot = Some(slot);
        if let Some(notes) = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            self.notes = Some(notes);
        }
        self.step = BookingStep::Confirming;
        self.touch();
        Ok(())
    }

    fn has_selection_for(&self, step: BookingStep) -> bool {
        match step {
            BookingStep::SelectingSpecialty => self.specialty.is_some(),
            BookingStep::SelectingPractitioner => self.practitioner.is_some(),
            BookingStep::SelectingSlot => self.slot.is_some(),
            BookingStep::Confirming | BookingStep::Finalized => false,
        }
    }

    /// Move forward re-using the selection retained for the current step.
    pub fn advance(&mut self) -> Result<BookingStep> {
        let next = match self.step {
            BookingStep::Confirming | BookingStep::Finalized => {
                return Err(PlatformError::invalid_transition(
                    "BookingFlow",
                    self.step,
                    BookingStep::Finalized,
                ));
            }
            step => step.next().unwrap_or(step),
        };

        if !self.has_selection_for(self.step) {
            return Err(PlatformError::missing_field(match self.step {
                BookingStep::SelectingSpecialty => "specialty",
                BookingStep::SelectingPractitioner => "practitionerId",
                _ => "slot",
            }));
        }

        self.step = next;
        self.touch();
        Ok(next)
    }

    /// Return to an earlier step. Selections made after `step` are dropped.
    pub fn back_to(&mut self, step: BookingStep) -> Result<()> {
        if self.step == BookingStep::Finalized || step >= self.step {
            return Err(PlatformError::invalid_transition("BookingFlow", self.step, step));
        }

        if step < BookingStep::SelectingPractitioner {
            self.practitioner = None;
        }
        if step < BookingStep::SelectingSlot {
            self.slot = None;
            self.notes = None;
        }
        self.step = step;
        self.touch();
        Ok(())
    }

    /// The booking this flow asks for. Only available while confirming.
    pub fn booking_command(&self) -> Result<BookAppointmentCommand> {
        self.expect_step(BookingStep::Confirming)?;

        let specialty = self.specialty.clone().ok_or_else(|| PlatformError::missing_field("specialty"))?;
        let practitioner = self
            .practitioner
            .as_ref()
            .ok_or_else(|| PlatformError::missing_field("practitionerId"))?;
        let slot = self.slot.ok_or_else(|| PlatformError::missing_field("slot"))?;

        Ok(BookAppointmentCommand {
            specialty,
            practitioner_id: practitioner.id.clone(),
            slot,
            notes: self.notes.clone(),
            patient_id: Some(self.patient_id.clone()),
        })
    }

    pub fn finalize(&mut self, appointment_id: impl Into<String>) {
        self.appointment_id = Some(appointment_id.into());
        self.step = BookingStep::Finalized;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use chrono::{NaiveDate, NaiveTime};
    use dc_common::Role;

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.register(Practitioner::new("stu-7", "Ana", Role::Student).with_specialty("Orthodontics"))
            .unwrap();
        dir.register(Practitioner::new("prof-2", "Dr. Kim", Role::Professor).with_specialty("Orthodontics"))
            .unwrap();
        dir
    }

    fn slot(h: u32) -> TimeSlot {
        TimeSlot {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(h + 1, 0, 0).unwrap(),
        }
    }

    fn confirming_flow(dir: &InMemoryDirectory) -> BookingFlow {
        let mut flow = BookingFlow::new("pat-1");
        flow.select_specialty("Orthodontics", dir).unwrap();
        flow.select_practitioner("stu-7", dir).unwrap();
        flow.select_slot(slot(9), Some("first visit".into())).unwrap();
        flow
    }

    #[test]
    fn test_forward_path_reaches_confirming() {
        let dir = directory();
        let flow = confirming_flow(&dir);
        assert_eq!(flow.step, BookingStep::Confirming);

        let cmd = flow.booking_command().unwrap();
        assert_eq!(cmd.practitioner_id, "stu-7");
        assert_eq!(cmd.slot, slot(9));
        assert_eq!(cmd.notes.as_deref(), Some("first visit"));
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let dir = directory();
        let mut flow = BookingFlow::new("pat-1");
        let err = flow.select_practitioner("stu-7", &dir).unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(flow.step, BookingStep::SelectingSpecialty);
    }

    #[test]
    fn test_back_keeps_target_selection_and_drops_later_ones() {
        let dir = directory();
        let mut flow = confirming_flow(&dir);

        flow.back_to(BookingStep::SelectingPractitioner).unwrap();
        assert_eq!(flow.step, BookingStep::SelectingPractitioner);
        assert_eq!(flow.specialty.as_deref(), Some("Orthodontics"));
        assert_eq!(flow.practitioner.as_ref().map(|p| p.id.as_str()), Some("stu-7"));
        assert!(flow.slot.is_none());
        assert!(flow.notes.is_none());

        // Retained practitioner lets the patient move on without re-picking
        assert_eq!(flow.advance().unwrap(), BookingStep::SelectingSlot);
        assert_eq!(flow.advance().unwrap_err().code(), "MISSING_REQUIRED_FIELD");
    }

    #[test]
    fn test_back_to_later_step_is_rejected() {
        let dir = directory();
        let mut flow = BookingFlow::new("pat-1");
        flow.select_specialty("Orthodontics", &dir).unwrap();
        assert!(flow.back_to(BookingStep::SelectingSlot).is_err());
        assert!(flow.back_to(BookingStep::SelectingPractitioner).is_err());
    }

    #[test]
    fn test_practitioner_must_serve_specialty() {
        let dir = directory();
        dir.register(Practitioner::new("prof-9", "Dr. Roe", Role::Professor).with_specialty("Endodontics"))
            .unwrap();
        let mut flow = BookingFlow::new("pat-1");
        flow.select_specialty("Orthodontics", &dir).unwrap();

        let err = flow.select_practitioner("prof-9", &dir).unwrap_err();
        assert_eq!(err.code(), "SPECIALTY_NOT_SERVED");
        assert_eq!(flow.step, BookingStep::SelectingPractitioner);
    }

    #[test]
    fn test_finalized_flow_cannot_go_back() {
        let dir = directory();
        let mut flow = confirming_flow(&dir);
        flow.finalize("appt-1");
        assert!(flow.back_to(BookingStep::SelectingSlot).is_err());
        assert!(flow.advance().is_err());
    }
}
