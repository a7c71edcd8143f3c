//! Workflow Integration Tests
//!
//! Drives the platform facade end to end:
//! - Seat capacity and slot conflicts, including under contention
//! - Approval, case, assignment and evaluation lifecycles
//! - Role and ownership scoping
//! - The guided booking flow
//! - Notifications produced by committed changes

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use chrono::{NaiveDate, NaiveTime};
use dc_common::{Actor, Role};
use dc_platform::approval::operations::SubmitApprovalRequestCommand;
use dc_platform::appointment::operations::BookAppointmentCommand;
use dc_platform::assignment::operations::CreateAssignmentCommand;
use dc_platform::clinical_case::operations::{
    OpenCaseCommand, RecordCaseProgressCommand, ReviewCaseCommand, TransitionCaseCommand,
};
use dc_platform::evaluation::operations::{CreateEvaluationCommand, CriterionInput, CriterionScore, SubmitScoresCommand};
use dc_platform::notification::operations::NotificationFilter;
use dc_platform::schedule::operations::{CreateScheduleCommand, UpdateScheduleCommand};
use dc_platform::{
    AppointmentStatus, ApprovalStatus, AssignmentStatus, BookingStep, CaseApprovalStatus, CaseStatus, ClinicPlatform,
    DayOfWeek, DenyReason, EntityKind, EvaluationStatus, ExecutionContext, InMemoryDirectory, NotificationType,
    Practitioner, PlatformError, Schedule, ScheduleStatus, ScheduleType, TaskStatus, TimeSlot,
};

const PROFESSOR: &str = "prof-lee";
const OTHER_PROFESSOR: &str = "prof-kim";
const STUDENT: &str = "stu-ana";
const PATIENT: &str = "pat-sam";

fn platform() -> ClinicPlatform {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .register(Practitioner::new(PROFESSOR, "Dr. Lee", Role::Professor).with_specialty("Orthodontics"))
        .unwrap();
    directory
        .register(Practitioner::new(OTHER_PROFESSOR, "Dr. Kim", Role::Professor).with_specialty("Endodontics"))
        .unwrap();
    directory
        .register(
            Practitioner::new(STUDENT, "Ana Ruiz", Role::Student)
                .with_specialty("Orthodontics")
                .with_specialty("Periodontics"),
        )
        .unwrap();
    ClinicPlatform::in_memory(directory)
}

fn admin() -> ExecutionContext {
    ExecutionContext::create(Actor::admin("admin"))
}

fn professor() -> ExecutionContext {
    ExecutionContext::create(Actor::professor(PROFESSOR))
}

fn student() -> ExecutionContext {
    ExecutionContext::create(Actor::student(STUDENT))
}

fn patient() -> ExecutionContext {
    ExecutionContext::create(Actor::patient(PATIENT))
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
    TimeSlot::new(monday(), at(start.0, start.1), at(end.0, end.1)).unwrap()
}

fn schedule(platform: &ClinicPlatform, capacity: u32) -> Schedule {
    platform
        .create_schedule(
            &admin(),
            CreateScheduleCommand {
                title: "Orthodontics Clinic".to_string(),
                schedule_type: ScheduleType::Clinic,
                instructor_id: PROFESSOR.to_string(),
                room: "Clinic 2".to_string(),
                day_of_week: DayOfWeek::Tuesday,
                start_time: at(9, 0),
                end_time: at(12, 0),
                capacity,
                specialty: Some("Orthodontics".to_string()),
                semester: Some("2026-S1".to_string()),
            },
        )
        .unwrap()
}

fn book(platform: &ClinicPlatform, ctx: &ExecutionContext, slot: TimeSlot) -> Result<dc_platform::Appointment, PlatformError> {
    platform.book_appointment(
        ctx,
        BookAppointmentCommand {
            specialty: "Orthodontics".to_string(),
            practitioner_id: STUDENT.to_string(),
            slot,
            notes: None,
            patient_id: None,
        },
    )
}

fn submit_request(platform: &ClinicPlatform) -> dc_platform::ApprovalRequest {
    platform
        .submit_approval_request(
            &student(),
            SubmitApprovalRequestCommand {
                patient_id: PATIENT.to_string(),
                professor_id: PROFESSOR.to_string(),
                specialty: "Orthodontics".to_string(),
                description: "Brackets on upper arch".to_string(),
                attachments: vec!["xray-01.png".to_string()],
                student_id: None,
            },
        )
        .unwrap()
}

fn open_case(platform: &ClinicPlatform, total_sessions: u32) -> dc_platform::ClinicalCase {
    platform
        .open_case(
            &student(),
            OpenCaseCommand {
                patient_id: PATIENT.to_string(),
                professor_id: PROFESSOR.to_string(),
                treatment: "Upper arch brackets".to_string(),
                specialty: "Orthodontics".to_string(),
                total_sessions,
                student_id: None,
            },
        )
        .unwrap()
}

fn inbox(platform: &ClinicPlatform, ctx: &ExecutionContext) -> Vec<dc_platform::Notification> {
    platform.list_notifications(ctx, &NotificationFilter::default()).unwrap()
}

mod capacity_tests {
    use super::*;

    #[test]
    fn test_full_schedule_rejects_enrollment() {
        let platform = platform();
        let s = schedule(&platform, 8);

        for i in 0..8 {
            platform
                .enroll_in_schedule(&admin(), &s.id, Some(&format!("stu-{}", i)))
                .unwrap();
        }

        let err = platform
            .enroll_in_schedule(&admin(), &s.id, Some("stu-late"))
            .unwrap_err();
        assert!(matches!(err, PlatformError::CapacityExceeded { capacity: 8, .. }));

        let availability = platform.schedule_availability(&admin(), &s.id).unwrap();
        assert_eq!(availability.enrolled, 8);
        assert!(availability.is_full);
    }

    #[test]
    fn test_release_twice_is_same_as_once() {
        let platform = platform();
        let s = schedule(&platform, 3);
        let token = platform.enroll_in_schedule(&student(), &s.id, None).unwrap();
        platform
            .enroll_in_schedule(&admin(), &s.id, Some("stu-ben"))
            .unwrap();

        assert!(platform.release_reservation(&student(), &token.id).unwrap());
        let after_first = platform.get_schedule(&admin(), &s.id).unwrap();

        assert!(!platform.release_reservation(&student(), &token.id).unwrap());
        let after_second = platform.get_schedule(&admin(), &s.id).unwrap();

        assert_eq!(after_first.enrolled, 1);
        assert_eq!(after_second.enrolled, 1);
        assert_eq!(after_first.updated_at, after_second.updated_at);
    }

    #[test]
    fn test_capacity_cannot_drop_below_enrolled() {
        let platform = platform();
        let s = schedule(&platform, 4);
        for id in ["stu-1", "stu-2", "stu-3"] {
            platform.enroll_in_schedule(&admin(), &s.id, Some(id)).unwrap();
        }

        let err = platform
            .update_schedule(
                &admin(),
                &s.id,
                UpdateScheduleCommand {
                    capacity: Some(2),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
        assert_eq!(platform.get_schedule(&admin(), &s.id).unwrap().capacity, 4);

        let resized = platform
            .update_schedule(
                &admin(),
                &s.id,
                UpdateScheduleCommand {
                    capacity: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(resized.capacity, 3);
        assert_eq!(resized.enrolled, 3);
    }

    #[test]
    fn test_inactive_schedule_rejects_enrollment() {
        let platform = platform();
        let s = schedule(&platform, 5);
        platform
            .set_schedule_status(&admin(), &s.id, ScheduleStatus::Inactive)
            .unwrap();

        assert!(platform.enroll_in_schedule(&student(), &s.id, None).is_err());
        assert_eq!(platform.get_schedule(&admin(), &s.id).unwrap().enrolled, 0);
    }

    #[test]
    fn test_student_cannot_hold_two_seats() {
        let platform = platform();
        let s = schedule(&platform, 5);
        platform.enroll_in_schedule(&student(), &s.id, None).unwrap();

        assert!(platform.enroll_in_schedule(&student(), &s.id, None).is_err());
        assert_eq!(platform.get_schedule(&admin(), &s.id).unwrap().enrolled, 1);
    }

    #[test]
    fn test_concurrent_enrollment_never_overbooks() {
        let platform = Arc::new(platform());
        let s = schedule(&platform, 5);

        let handles: Vec<_> = (0..24)
            .map(|i| {
                let platform = Arc::clone(&platform);
                let schedule_id = s.id.clone();
                thread::spawn(move || {
                    let ctx = ExecutionContext::create(Actor::student(format!("stu-{}", i)));
                    platform.enroll_in_schedule(&ctx, &schedule_id, None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(PlatformError::CapacityExceeded { .. })))
            .count();

        assert_eq!(accepted, 5);
        assert_eq!(rejected, 19);
        assert_eq!(platform.get_schedule(&admin(), &s.id).unwrap().enrolled, 5);
    }
}

mod appointment_tests {
    use super::*;

    #[test]
    fn test_overlapping_booking_conflicts() {
        let platform = platform();
        let first = book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        assert_eq!(first.status, AppointmentStatus::Pending);

        let other = ExecutionContext::create(Actor::patient("pat-joe"));
        let err = book(&platform, &other, slot((9, 30), (10, 30))).unwrap_err();
        assert!(matches!(err, PlatformError::SlotConflict { ref conflicting_id, .. } if *conflicting_id == first.id));
        assert_eq!(platform.store().appointments.count().unwrap(), 1);
    }

    #[test]
    fn test_touching_slots_do_not_conflict() {
        let platform = platform();
        book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        let other = ExecutionContext::create(Actor::patient("pat-joe"));
        assert!(book(&platform, &other, slot((10, 0), (11, 0))).is_ok());
    }

    #[test]
    fn test_cancelled_slot_can_be_rebooked() {
        let platform = platform();
        let first = book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();

        let cancelled = platform
            .cancel_appointment(&patient(), &first.id, Some("travelling".to_string()))
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("travelling"));

        let other = ExecutionContext::create(Actor::patient("pat-joe"));
        assert!(book(&platform, &other, slot((9, 0), (10, 0))).is_ok());
    }

    #[test]
    fn test_patient_cannot_confirm() {
        let platform = platform();
        let appointment = book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();

        let err = platform.confirm_appointment(&patient(), &appointment.id).unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::RoleNotPermitted));

        let confirmed = platform.confirm_appointment(&student(), &appointment.id).unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        let completed = platform.complete_appointment(&student(), &appointment.id).unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);

        let err = platform
            .cancel_appointment(&patient(), &appointment.id, None)
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidTransition { .. }));
    }

    #[test]
    fn test_open_slots_skip_booked_time() {
        let platform = platform();
        let before = platform.open_slots(&patient(), STUDENT, monday()).unwrap();
        assert_eq!(before.len(), 10);

        book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        let after = platform.open_slots(&patient(), STUDENT, monday()).unwrap();
        assert_eq!(after.len(), 9);
        assert!(!after.iter().any(|s| s.start_time == at(9, 0)));
    }

    #[test]
    fn test_patients_only_see_their_own_appointments() {
        let platform = platform();
        book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        let other = ExecutionContext::create(Actor::patient("pat-joe"));
        let theirs = book(&platform, &other, slot((11, 0), (12, 0))).unwrap();

        let mine = platform.list_appointments(&patient()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].patient_id, PATIENT);

        let err = platform.get_appointment(&patient(), &theirs.id).unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::NotOwner));
    }

    #[test]
    fn test_concurrent_booking_of_one_slot_has_one_winner() {
        let platform = Arc::new(platform());

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let platform = Arc::clone(&platform);
                thread::spawn(move || {
                    let ctx = ExecutionContext::create(Actor::patient(format!("pat-{}", i)));
                    book(&platform, &ctx, slot((14, 0), (15, 0)))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(PlatformError::SlotConflict { .. })))
                .count(),
            11
        );

        let active = platform
            .store()
            .appointments
            .find_where(&|a| a.status.is_active())
            .unwrap();
        assert_eq!(active.len(), 1);
    }
}

mod approval_tests {
    use super::*;

    #[test]
    fn test_professor_approves_request() {
        let platform = platform();
        let request = submit_request(&platform);
        assert_eq!(request.status, ApprovalStatus::Pending);
        assert!(request.response.is_none());

        let approved = platform
            .respond_to_approval_request(&professor(), &request.id, ApprovalStatus::Approved, Some("ok".to_string()))
            .unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
        assert_eq!(approved.response.as_deref(), Some("ok"));
        assert!(approved.response_date.is_some());

        let stored = platform.get_approval_request(&student(), &request.id).unwrap();
        assert_eq!(stored, approved);

        let notes = inbox(&platform, &student());
        assert!(notes
            .iter()
            .any(|n| n.source_id == request.id && n.notification_type == NotificationType::Approval));
    }

    #[test]
    fn test_submission_notifies_assigned_professor() {
        let platform = platform();
        let request = submit_request(&platform);

        let notes = inbox(&platform, &professor());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].source_id, request.id);
        assert!(inbox(&platform, &student()).is_empty());
    }

    #[test]
    fn test_patient_cannot_respond() {
        let platform = platform();
        let request = submit_request(&platform);

        let err = platform
            .respond_to_approval_request(&patient(), &request.id, ApprovalStatus::Approved, Some("ok".to_string()))
            .unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));

        let stored = platform.get_approval_request(&admin(), &request.id).unwrap();
        assert_eq!(stored.status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_only_the_assignee_may_respond() {
        let platform = platform();
        let request = submit_request(&platform);
        let other = ExecutionContext::create(Actor::professor(OTHER_PROFESSOR));

        let err = platform
            .respond_to_approval_request(&other, &request.id, ApprovalStatus::Rejected, Some("no".to_string()))
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::NotAssignee));
    }

    #[test]
    fn test_response_text_is_required() {
        let platform = platform();
        let request = submit_request(&platform);

        let err = platform
            .respond_to_approval_request(&professor(), &request.id, ApprovalStatus::Rejected, None)
            .unwrap_err();
        assert!(matches!(err, PlatformError::MissingRequiredField { .. }));

        let stored = platform.get_approval_request(&admin(), &request.id).unwrap();
        assert_eq!(stored.status, ApprovalStatus::Pending);
        assert!(stored.response.is_none() && stored.response_date.is_none());
    }

    #[test]
    fn test_decided_request_cannot_be_decided_again() {
        let platform = platform();
        let request = submit_request(&platform);
        platform
            .respond_to_approval_request(&professor(), &request.id, ApprovalStatus::Approved, Some("ok".to_string()))
            .unwrap();

        let err = platform
            .respond_to_approval_request(&professor(), &request.id, ApprovalStatus::Rejected, Some("no".to_string()))
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidTransition { .. }));
    }

    #[test]
    fn test_professor_cannot_read_another_queue() {
        let platform = platform();
        submit_request(&platform);

        assert_eq!(platform.pending_queue(&professor(), PROFESSOR).unwrap().len(), 1);

        let other = ExecutionContext::create(Actor::professor(OTHER_PROFESSOR));
        let err = platform.pending_queue(&other, PROFESSOR).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));
    }

    #[test]
    fn test_decided_requests_always_carry_a_response() {
        let platform = platform();
        for decision in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            let request = submit_request(&platform);
            platform
                .respond_to_approval_request(&professor(), &request.id, decision, Some("reviewed".to_string()))
                .unwrap();
        }
        submit_request(&platform);

        for request in platform.store().approvals.find_all().unwrap() {
            if request.status != ApprovalStatus::Pending {
                assert!(request.response.is_some());
                assert!(request.response_date.is_some());
            }
        }
    }

    #[test]
    fn test_concurrent_decisions_apply_once() {
        for _ in 0..50 {
            let platform = Arc::new(platform());
            let request = submit_request(&platform);
            let barrier = Arc::new(Barrier::new(2));

            let deciders = [
                (professor(), ApprovalStatus::Approved, "ok"),
                (admin(), ApprovalStatus::Rejected, "no"),
            ];
            let handles: Vec<_> = deciders
                .into_iter()
                .map(|(ctx, decision, response)| {
                    let platform = Arc::clone(&platform);
                    let barrier = Arc::clone(&barrier);
                    let id = request.id.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        platform.respond_to_approval_request(&ctx, &id, decision, Some(response.to_string()))
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winner = results.iter().find_map(|r| r.as_ref().ok()).cloned().unwrap();
            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(PlatformError::InvalidTransition { .. }))));

            let stored = platform.get_approval_request(&admin(), &request.id).unwrap();
            assert_eq!(stored.status, winner.status);

            let transitions = platform
                .events()
                .for_entity(EntityKind::ApprovalRequest, &request.id)
                .into_iter()
                .filter(|e| e.transitioned_to("status").is_some())
                .count();
            assert_eq!(transitions, 1);

            let decisions = inbox(&platform, &student())
                .into_iter()
                .filter(|n| n.source_id == request.id && n.notification_type == NotificationType::Approval)
                .count();
            assert_eq!(decisions, 1);
        }
    }
}

mod case_tests {
    use super::*;

    #[test]
    fn test_case_completes_only_when_sessions_done() {
        let platform = platform();
        let case = open_case(&platform, 4);

        platform
            .record_case_progress(
                &student(),
                RecordCaseProgressCommand {
                    case_id: case.id.clone(),
                    sessions_completed: Some(2),
                    progress: None,
                },
            )
            .unwrap();

        let complete = TransitionCaseCommand {
            case_id: case.id.clone(),
            target: CaseStatus::Completed,
            reason: None,
        };
        assert!(platform.transition_case(&professor(), complete.clone()).is_err());

        platform
            .record_case_progress(
                &student(),
                RecordCaseProgressCommand {
                    case_id: case.id.clone(),
                    sessions_completed: Some(4),
                    progress: None,
                },
            )
            .unwrap();
        let completed = platform.transition_case(&professor(), complete).unwrap();

        assert_eq!(completed.status, CaseStatus::Completed);
        assert_eq!(completed.progress, 100);
        assert_eq!(completed.sessions_completed, completed.total_sessions);
    }

    #[test]
    fn test_student_cannot_complete_a_case() {
        let platform = platform();
        let case = open_case(&platform, 1);

        let err = platform
            .transition_case(
                &student(),
                TransitionCaseCommand {
                    case_id: case.id,
                    target: CaseStatus::Completed,
                    reason: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::RoleNotPermitted));
    }

    #[test]
    fn test_revision_round_trip() {
        let platform = platform();
        let case = open_case(&platform, 3);

        let revised = platform
            .review_case(
                &professor(),
                ReviewCaseCommand {
                    case_id: case.id.clone(),
                    outcome: CaseApprovalStatus::RevisionNeeded,
                    notes: Some("Add the periapical radiograph".to_string()),
                },
            )
            .unwrap();
        assert_eq!(revised.approval_status, CaseApprovalStatus::RevisionNeeded);
        assert_eq!(revised.review_notes.as_deref(), Some("Add the periapical radiograph"));
        assert_eq!(revised.status, case.status);
        assert_eq!(revised.progress, case.progress);

        let resubmitted = platform.resubmit_case(&student(), &case.id).unwrap();
        assert_eq!(resubmitted.approval_status, CaseApprovalStatus::Pending);

        let approved = platform
            .review_case(
                &professor(),
                ReviewCaseCommand {
                    case_id: case.id,
                    outcome: CaseApprovalStatus::Approved,
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(approved.approval_status, CaseApprovalStatus::Approved);
    }

    #[test]
    fn test_cancel_requires_reason() {
        let platform = platform();
        let case = open_case(&platform, 3);

        let err = platform
            .transition_case(
                &professor(),
                TransitionCaseCommand {
                    case_id: case.id.clone(),
                    target: CaseStatus::Cancelled,
                    reason: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, PlatformError::MissingRequiredField { .. }));
        assert_eq!(platform.get_case(&admin(), &case.id).unwrap().status, CaseStatus::Active);
    }

    #[test]
    fn test_transition_is_recorded_in_event_log() {
        let platform = platform();
        let case = open_case(&platform, 2);
        platform
            .transition_case(
                &student(),
                TransitionCaseCommand {
                    case_id: case.id.clone(),
                    target: CaseStatus::OnHold,
                    reason: None,
                },
            )
            .unwrap();

        let events = platform.events().for_entity(EntityKind::ClinicalCase, &case.id);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].transitioned_to("status"), Some("on-hold"));
    }
}

mod coursework_tests {
    use super::*;

    fn create_assignment(platform: &ClinicPlatform) -> dc_platform::Assignment {
        platform
            .create_assignment(
                &professor(),
                CreateAssignmentCommand {
                    title: "Cephalometric analysis".to_string(),
                    description: None,
                    specialty: "Orthodontics".to_string(),
                    cohort: vec![STUDENT.to_string(), "stu-ben".to_string()],
                    due_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                    professor_id: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_publish_fans_out_tasks_and_notifies_cohort() {
        let platform = platform();
        let assignment = create_assignment(&platform);
        assert_eq!(assignment.status, AssignmentStatus::Draft);
        assert_eq!(platform.store().tasks.count().unwrap(), 0);

        let published = platform.publish_assignment(&professor(), &assignment.id).unwrap();
        assert_eq!(published.status, AssignmentStatus::Published);

        let tasks = platform.assignment_tasks(&professor(), &assignment.id).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));

        let ben = ExecutionContext::create(Actor::student("stu-ben"));
        for ctx in [student(), ben] {
            assert!(inbox(&platform, &ctx)
                .iter()
                .any(|n| n.notification_type == NotificationType::Assignment));
        }
    }

    #[test]
    fn test_task_progress_drives_status() {
        let platform = platform();
        let assignment = create_assignment(&platform);
        platform.publish_assignment(&professor(), &assignment.id).unwrap();

        let task = platform
            .list_tasks(&student())
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(task.student_id, STUDENT);

        let started = platform.update_task_progress(&student(), &task.id, 40).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);

        let done = platform.update_task_progress(&student(), &task.id, 100).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(inbox(&platform, &professor())
            .iter()
            .any(|n| n.source_id == task.id && n.notification_type == NotificationType::Task));

        let reviewed = platform
            .give_task_feedback(&professor(), &task.id, "Clean tracing")
            .unwrap();
        assert_eq!(reviewed.feedback.as_deref(), Some("Clean tracing"));

        let closed = platform.close_task(&professor(), &task.id).unwrap();
        assert_eq!(closed.status, TaskStatus::Closed);
    }

    #[test]
    fn test_feedback_rejected_on_pending_task() {
        let platform = platform();
        let assignment = create_assignment(&platform);
        platform.publish_assignment(&professor(), &assignment.id).unwrap();
        let task = platform.list_tasks(&student()).unwrap().remove(0);

        assert!(platform.give_task_feedback(&professor(), &task.id, "Too early").is_err());
        assert!(platform.get_task(&student(), &task.id).unwrap().feedback.is_none());
    }

    #[test]
    fn test_student_cannot_publish() {
        let platform = platform();
        let assignment = create_assignment(&platform);

        let err = platform.publish_assignment(&student(), &assignment.id).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));
        assert_eq!(platform.store().tasks.count().unwrap(), 0);
    }

    #[test]
    fn test_evaluation_completes_once_every_criterion_scored() {
        let platform = platform();
        let evaluation = platform
            .create_evaluation(
                &professor(),
                CreateEvaluationCommand {
                    student_id: STUDENT.to_string(),
                    title: "Mid-term clinical skills".to_string(),
                    criteria: vec![
                        CriterionInput {
                            name: "Technique".to_string(),
                            weight: 2.0,
                            max_score: 10.0,
                        },
                        CriterionInput {
                            name: "Communication".to_string(),
                            weight: 1.0,
                            max_score: 10.0,
                        },
                    ],
                    comments: None,
                    professor_id: None,
                },
            )
            .unwrap();
        assert_eq!(evaluation.status, EvaluationStatus::Pending);
        assert_eq!(evaluation.overall_grade(), None);

        let partial = platform
            .submit_evaluation_scores(
                &professor(),
                SubmitScoresCommand {
                    evaluation_id: evaluation.id.clone(),
                    scores: vec![CriterionScore {
                        name: "Technique".to_string(),
                        score: 8.0,
                    }],
                    comments: None,
                },
            )
            .unwrap();
        assert_eq!(partial.status, EvaluationStatus::Pending);

        let complete = platform
            .submit_evaluation_scores(
                &professor(),
                SubmitScoresCommand {
                    evaluation_id: evaluation.id.clone(),
                    scores: vec![CriterionScore {
                        name: "Communication".to_string(),
                        score: 10.0,
                    }],
                    comments: Some("Solid work".to_string()),
                },
            )
            .unwrap();
        assert_eq!(complete.status, EvaluationStatus::Completed);
        assert_eq!(complete.overall_grade(), Some(8.67));
        assert!(inbox(&platform, &student())
            .iter()
            .any(|n| n.notification_type == NotificationType::Evaluation));
    }

    #[test]
    fn test_task_progress_never_goes_back() {
        let platform = platform();
        let assignment = create_assignment(&platform);
        platform.publish_assignment(&professor(), &assignment.id).unwrap();
        let task = platform.list_tasks(&student()).unwrap().remove(0);

        platform.update_task_progress(&student(), &task.id, 80).unwrap();
        let err = platform.update_task_progress(&student(), &task.id, 10).unwrap_err();
        assert_eq!(err.code(), "PROGRESS_REGRESSION");

        let stored = platform.get_task(&student(), &task.id).unwrap();
        assert_eq!(stored.progress, 80);
        assert_eq!(stored.status, TaskStatus::InProgress);

        // Reporting the same figure again is accepted
        assert_eq!(platform.update_task_progress(&student(), &task.id, 80).unwrap().progress, 80);
    }

    #[test]
    fn test_concurrent_publish_fans_out_once() {
        let platform = Arc::new(platform());
        let assignment = create_assignment(&platform);
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let platform = Arc::clone(&platform);
                let barrier = Arc::clone(&barrier);
                let id = assignment.id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    platform.publish_assignment(&professor(), &id)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(platform.store().tasks.count().unwrap(), 2);
    }
}

mod booking_flow_tests {
    use super::*;

    fn flow_at_confirming(platform: &ClinicPlatform, slot: TimeSlot) -> String {
        let flow = platform.start_booking(&patient()).unwrap();
        assert_eq!(flow.step, BookingStep::SelectingSpecialty);

        platform.select_specialty(&patient(), &flow.id, "Orthodontics").unwrap();
        platform.select_practitioner(&patient(), &flow.id, STUDENT).unwrap();
        let flow = platform.select_slot(&patient(), &flow.id, slot, None).unwrap();
        assert_eq!(flow.step, BookingStep::Confirming);
        flow.id
    }

    #[test]
    fn test_confirm_books_appointment() {
        let platform = platform();
        let flow_id = flow_at_confirming(&platform, slot((9, 0), (10, 0)));

        let (flow, appointment) = platform.confirm_booking(&patient(), &flow_id).unwrap();
        assert_eq!(flow.step, BookingStep::Finalized);
        assert_eq!(flow.appointment_id.as_deref(), Some(appointment.id.as_str()));
        assert_eq!(appointment.patient_id, PATIENT);
        assert_eq!(appointment.practitioner_id, STUDENT);

        // A finalized flow is handed back and dropped from the registry
        assert!(matches!(
            platform.booking(&patient(), &flow_id),
            Err(PlatformError::NotFound { .. })
        ));
    }

    #[test]
    fn test_conflict_keeps_flow_confirming() {
        let platform = platform();
        let flow_id = flow_at_confirming(&platform, slot((9, 0), (10, 0)));

        let other = ExecutionContext::create(Actor::patient("pat-joe"));
        book(&platform, &other, slot((9, 0), (10, 0))).unwrap();

        let err = platform.confirm_booking(&patient(), &flow_id).unwrap_err();
        assert!(matches!(err, PlatformError::SlotConflict { .. }));

        let flow = platform.booking(&patient(), &flow_id).unwrap();
        assert_eq!(flow.step, BookingStep::Confirming);
        assert!(flow.appointment_id.is_none());
        assert_eq!(platform.store().appointments.count().unwrap(), 1);
    }

    #[test]
    fn test_back_keeps_earlier_selections() {
        let platform = platform();
        let flow_id = flow_at_confirming(&platform, slot((9, 0), (10, 0)));

        let flow = platform
            .booking_back_to(&patient(), &flow_id, BookingStep::SelectingPractitioner)
            .unwrap();
        assert_eq!(flow.step, BookingStep::SelectingPractitioner);
        assert_eq!(flow.specialty.as_deref(), Some("Orthodontics"));
        assert!(flow.practitioner.is_some());
        assert!(flow.slot.is_none());

        let flow = platform.booking_advance(&patient(), &flow_id).unwrap();
        assert_eq!(flow.step, BookingStep::SelectingSlot);
    }

    #[test]
    fn test_practitioner_must_serve_specialty() {
        let platform = platform();
        let flow = platform.start_booking(&patient()).unwrap();
        platform.select_specialty(&patient(), &flow.id, "Periodontics").unwrap();

        assert!(platform.select_practitioner(&patient(), &flow.id, PROFESSOR).is_err());
        let practitioners = platform.booking_practitioners(&patient(), &flow.id).unwrap();
        assert_eq!(practitioners.len(), 1);
        assert_eq!(practitioners[0].id, STUDENT);
    }

    #[test]
    fn test_flow_belongs_to_its_patient() {
        let platform = platform();
        let flow = platform.start_booking(&patient()).unwrap();
        let other = ExecutionContext::create(Actor::patient("pat-joe"));

        assert!(platform.booking(&other, &flow.id).is_err());
        platform.abandon_booking(&patient(), &flow.id).unwrap();
        assert!(matches!(
            platform.booking(&patient(), &flow.id),
            Err(PlatformError::NotFound { .. })
        ));
    }
}

mod notification_tests {
    use super::*;

    #[test]
    fn test_read_toggles_and_delete() {
        let platform = platform();
        submit_request(&platform);
        submit_request(&platform);

        let ctx = professor();
        assert_eq!(platform.unread_count(&ctx).unwrap(), 2);

        let first = inbox(&platform, &ctx).remove(0);
        let read = platform.mark_read(&ctx, &first.id).unwrap();
        assert!(read.is_read);
        assert_eq!(platform.unread_count(&ctx).unwrap(), 1);

        let unread = platform.mark_unread(&ctx, &first.id).unwrap();
        assert!(!unread.is_read);

        assert_eq!(platform.mark_all_read(&ctx).unwrap(), 2);
        assert_eq!(platform.unread_count(&ctx).unwrap(), 0);

        platform.delete_notification(&ctx, &first.id).unwrap();
        assert_eq!(inbox(&platform, &ctx).len(), 1);
    }

    #[test]
    fn test_cannot_touch_someone_elses_notification() {
        let platform = platform();
        submit_request(&platform);
        let note = inbox(&platform, &professor()).remove(0);

        assert!(platform.mark_read(&student(), &note.id).is_err());
        assert!(platform.delete_notification(&student(), &note.id).is_err());
        assert!(!platform.store().notifications.require(&note.id).unwrap().is_read);
    }

    #[test]
    fn test_cancellation_notifies_both_sides() {
        let platform = platform();
        let appointment = book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        platform
            .cancel_appointment(&admin(), &appointment.id, Some("clinic closed".to_string()))
            .unwrap();

        assert!(inbox(&platform, &patient())
            .iter()
            .any(|n| n.source_id == appointment.id));
        // booked + cancelled
        let practitioner_notes = inbox(&platform, &student())
            .into_iter()
            .filter(|n| n.source_id == appointment.id)
            .count();
        assert_eq!(practitioner_notes, 2);
    }

    #[test]
    fn test_actor_is_not_notified_of_own_change() {
        let platform = platform();
        let appointment = book(&platform, &patient(), slot((9, 0), (10, 0))).unwrap();
        platform
            .cancel_appointment(&patient(), &appointment.id, None)
            .unwrap();

        assert!(inbox(&platform, &patient()).is_empty());
    }
}
