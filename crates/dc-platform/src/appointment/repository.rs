//! Appointment queries

use chrono::NaiveDate;

use crate::appointment::entity::Appointment;
use crate::scheduling::TimeSlot;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait AppointmentQueries {
    /// Pending and confirmed appointments of a practitioner.
    fn find_active_for_practitioner(&self, practitioner_id: &str) -> Result<Vec<Appointment>>;

    fn find_active_on(&self, practitioner_id: &str, date: NaiveDate) -> Result<Vec<Appointment>>;

    /// First active appointment of the practitioner overlapping `slot`.
    fn find_conflict(&self, practitioner_id: &str, slot: &TimeSlot) -> Result<Option<Appointment>>;

    fn find_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>>;
}

impl<R: Repository<Appointment> + ?Sized> AppointmentQueries for R {
    fn find_active_for_practitioner(&self, practitioner_id: &str) -> Result<Vec<Appointment>> {
        self.find_where(&|a: &Appointment| a.practitioner_id == practitioner_id && a.is_active())
    }

    fn find_active_on(&self, practitioner_id: &str, date: NaiveDate) -> Result<Vec<Appointment>> {
        self.find_where(&|a: &Appointment| {
            a.practitioner_id == practitioner_id && a.date == date && a.is_active()
        })
    }

    fn find_conflict(&self, practitioner_id: &str, slot: &TimeSlot) -> Result<Option<Appointment>> {
        Ok(self
            .find_active_on(practitioner_id, slot.date)?
            .into_iter()
            .find(|a| a.slot().overlaps(slot)))
    }

    fn find_by_patient(&self, patient_id: &str) -> Result<Vec<Appointment>> {
        self.find_where(&|a: &Appointment| a.patient_id == patient_id)
    }
}
