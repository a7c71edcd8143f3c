//! Development Data Seeder
//!
//! Seeds a small clinic on startup when `dev_mode` is on. Everything past the
//! practitioner directory goes through the platform's own actions, so the
//! seeded records carry events and notifications like real ones.
//!
//! Dev callers (send as `X-Actor-Id` / `X-Actor-Role`):
//!   Admin:     admin        / admin
//!   Professor: prof-lee     / professor
//!   Students:  stu-ana, stu-ben / student
//!   Patient:   pat-sam      / patient

use chrono::{Datelike, Duration, NaiveTime, Utc, Weekday};
use dc_common::{Actor, Role};
use tracing::info;

use crate::approval::operations::SubmitApprovalRequestCommand;
use crate::appointment::operations::BookAppointmentCommand;
use crate::assignment::operations::CreateAssignmentCommand;
use crate::clinical_case::operations::{OpenCaseCommand, RecordCaseProgressCommand};
use crate::directory::{InMemoryDirectory, Practitioner};
use crate::evaluation::operations::{CreateEvaluationCommand, CriterionInput};
use crate::lifecycle::ApprovalStatus;
use crate::platform::ClinicPlatform;
use crate::schedule::entity::{DayOfWeek, ScheduleType};
use crate::schedule::operations::CreateScheduleCommand;
use crate::shared::error::{PlatformError, Result};
use crate::usecase::ExecutionContext;

pub const DEV_ADMIN: &str = "admin";
pub const DEV_PROFESSOR: &str = "prof-lee";
pub const DEV_STUDENTS: [&str; 2] = ["stu-ana", "stu-ben"];
pub const DEV_PATIENT: &str = "pat-sam";

/// Development data seeder
pub struct DevDataSeeder<'a> {
    platform: &'a ClinicPlatform,
}

impl<'a> DevDataSeeder<'a> {
    pub fn new(platform: &'a ClinicPlatform) -> Self {
        Self { platform }
    }

    /// Register the dev practitioners. Runs before the platform serves requests.
    pub fn seed_directory(directory: &InMemoryDirectory) -> Result<()> {
        directory.register(
            Practitioner::new(DEV_PROFESSOR, "Dr. Lee", Role::Professor)
                .with_specialty("Orthodontics")
                .with_specialty("Endodontics"),
        )?;
        directory.register(
            Practitioner::new(DEV_STUDENTS[0], "Ana Ruiz", Role::Student)
                .with_specialty("Orthodontics")
                .with_specialty("Periodontics"),
        )?;
        directory.register(
            Practitioner::new(DEV_STUDENTS[1], "Ben Okafor", Role::Student).with_specialty("Endodontics"),
        )?;
        info!("Registered 3 dev practitioners");
        Ok(())
    }

    /// Seed all development data
    pub fn seed(&self) -> Result<()> {
        info!("=== DEV DATA SEEDER ===");

        self.seed_schedules()?;
        self.seed_clinical_work()?;
        self.seed_coursework()?;
        self.seed_appointment()?;

        info!(
            events = self.platform.events().len(),
            "Development data seeded"
        );
        info!("Dev callers: admin/admin, prof-lee/professor, stu-ana/student, stu-ben/student, pat-sam/patient");
        info!("=======================");
        Ok(())
    }

    fn ctx(actor: Actor) -> ExecutionContext {
        ExecutionContext::with_correlation(actor, "dev-seed")
    }

    fn seed_schedules(&self) -> Result<()> {
        let admin = Self::ctx(Actor::admin(DEV_ADMIN));
        let at = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).ok_or_else(|| PlatformError::internal("bad seed time"));

        let clinic = self.platform.create_schedule(
            &admin,
            CreateScheduleCommand {
                title: "Orthodontics Clinic".to_string(),
                schedule_type: ScheduleType::Clinic,
                instructor_id: DEV_PROFESSOR.to_string(),
                room: "Clinic 2".to_string(),
                day_of_week: DayOfWeek::Tuesday,
                start_time: at(9)?,
                end_time: at(12)?,
                capacity: 6,
                specialty: Some("Orthodontics".to_string()),
                semester: Some("2026-S2".to_string()),
            },
        )?;
        self.platform.create_schedule(
            &admin,
            CreateScheduleCommand {
                title: "Dental Anatomy".to_string(),
                schedule_type: ScheduleType::Class,
                instructor_id: DEV_PROFESSOR.to_string(),
                room: "Lecture Hall A".to_string(),
                day_of_week: DayOfWeek::Monday,
                start_time: at(14)?,
                end_time: at(16)?,
                capacity: 40,
                specialty: None,
                semester: Some("2026-S2".to_string()),
            },
        )?;

        let student = Self::ctx(Actor::student(DEV_STUDENTS[0]));
        self.platform.enroll_in_schedule(&student, &clinic.id, None)?;

        info!("Seeded 2 schedules");
        Ok(())
    }

    fn seed_clinical_work(&self) -> Result<()> {
        let student = Self::ctx(Actor::student(DEV_STUDENTS[0]));
        let professor = Self::ctx(Actor::professor(DEV_PROFESSOR));

        let request = self.platform.submit_approval_request(
            &student,
            SubmitApprovalRequestCommand {
                patient_id: DEV_PATIENT.to_string(),
                professor_id: DEV_PROFESSOR.to_string(),
                specialty: "Orthodontics".to_string(),
                description: "Class II malocclusion, brackets on upper arch".to_string(),
                attachments: vec!["xray-0142.png".to_string()],
                student_id: None,
            },
        )?;
        self.platform.respond_to_approval_request(
            &professor,
            &request.id,
            ApprovalStatus::Approved,
            Some("Go ahead, book a supervised clinic slot".to_string()),
        )?;

        let case = self.platform.open_case(
            &student,
            OpenCaseCommand {
                patient_id: DEV_PATIENT.to_string(),
                professor_id: DEV_PROFESSOR.to_string(),
                treatment: "Upper arch brackets".to_string(),
                specialty: "Orthodontics".to_string(),
                total_sessions: 8,
                student_id: None,
            },
        )?;
        self.platform.record_case_progress(
            &student,
            RecordCaseProgressCommand {
                case_id: case.id,
                sessions_completed: Some(2),
                progress: None,
            },
        )?;

        // Second student waits on a decision
        self.platform.submit_approval_request(
            &Self::ctx(Actor::student(DEV_STUDENTS[1])),
            SubmitApprovalRequestCommand {
                patient_id: DEV_PATIENT.to_string(),
                professor_id: DEV_PROFESSOR.to_string(),
                specialty: "Endodontics".to_string(),
                description: "Root canal on tooth 36".to_string(),
                attachments: Vec::new(),
                student_id: None,
            },
        )?;

        info!("Seeded approval requests and a clinical case");
        Ok(())
    }

    fn seed_coursework(&self) -> Result<()> {
        let professor = Self::ctx(Actor::professor(DEV_PROFESSOR));
        let due_date = Utc::now().date_naive() + Duration::days(14);

        let assignment = self.platform.create_assignment(
            &professor,
            CreateAssignmentCommand {
                title: "Cephalometric analysis".to_string(),
                description: Some("Trace and annotate the provided radiograph".to_string()),
                specialty: "Orthodontics".to_string(),
                cohort: DEV_STUDENTS.iter().map(|s| s.to_string()).collect(),
                due_date,
                professor_id: None,
            },
        )?;
        self.platform.publish_assignment(&professor, &assignment.id)?;

        self.platform.create_evaluation(
            &professor,
            CreateEvaluationCommand {
                student_id: DEV_STUDENTS[0].to_string(),
                title: "Mid-term clinical skills".to_string(),
                criteria: vec![
                    CriterionInput {
                        name: "Technique".to_string(),
                        weight: 2.0,
                        max_score: 10.0,
                    },
                    CriterionInput {
                        name: "Patient communication".to_string(),
                        weight: 1.0,
                        max_score: 10.0,
                    },
                ],
                comments: None,
                professor_id: None,
            },
        )?;

        info!("Seeded an assignment and an evaluation");
        Ok(())
    }

    fn seed_appointment(&self) -> Result<()> {
        let mut date = Utc::now().date_naive() + Duration::days(1);
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
        }

        let Some(slot) = self.platform.booking_policy().slots_for(date).into_iter().next() else {
            return Ok(());
        };

        self.platform.book_appointment(
            &Self::ctx(Actor::patient(DEV_PATIENT)),
            BookAppointmentCommand {
                specialty: "Orthodontics".to_string(),
                practitioner_id: DEV_STUDENTS[0].to_string(),
                slot,
                notes: Some("First consultation".to_string()),
                patient_id: None,
            },
        )?;

        info!(%date, "Seeded an appointment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_seed_populates_every_aggregate() {
        let directory = Arc::new(InMemoryDirectory::new());
        DevDataSeeder::seed_directory(&directory).unwrap();
        let platform = ClinicPlatform::in_memory(directory);

        DevDataSeeder::new(&platform).seed().unwrap();

        let store = platform.store();
        assert_eq!(store.schedules.count().unwrap(), 2);
        assert_eq!(store.approvals.count().unwrap(), 2);
        assert_eq!(store.cases.count().unwrap(), 1);
        assert_eq!(store.assignments.count().unwrap(), 1);
        assert_eq!(store.tasks.count().unwrap(), 2);
        assert_eq!(store.evaluations.count().unwrap(), 1);
        assert_eq!(store.appointments.count().unwrap(), 1);
        assert!(store.notifications.count().unwrap() > 0);
    }
}
