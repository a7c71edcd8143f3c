//! Transition tables
//!
//! Every status-bearing entity's allowed moves, the roles that may make
//! them, and the fields each move writes.

use chrono::{DateTime, Utc};

use super::status::*;
use super::{Lifecycle, Transition, TransitionPayload, ADMIN_ONLY, ALL_ROLES, FACULTY, STAFF, STUDENT_SIDE};
use crate::academic_task::entity::AcademicTask;
use crate::appointment::entity::Appointment;
use crate::approval::entity::ApprovalRequest;
use crate::assignment::entity::Assignment;
use crate::clinical_case::entity::ClinicalCase;
use crate::evaluation::entity::Evaluation;
use crate::schedule::entity::Schedule;
use crate::shared::error::{PlatformError, Result};

// ============================================================================
// Appointment
// ============================================================================

pub struct AppointmentLifecycle;

const APPOINTMENT_TRANSITIONS: &[Transition<AppointmentStatus>] = &[
    Transition::new(AppointmentStatus::Pending, AppointmentStatus::Confirmed, STAFF, &[]),
    Transition::new(AppointmentStatus::Pending, AppointmentStatus::Cancelled, ALL_ROLES, &[]),
    Transition::new(AppointmentStatus::Confirmed, AppointmentStatus::Completed, STAFF, &[]),
    Transition::new(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled, ALL_ROLES, &[]),
];

impl Lifecycle for AppointmentLifecycle {
    type Entity = Appointment;
    type Status = AppointmentStatus;
    const ENTITY: &'static str = "Appointment";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<AppointmentStatus>] {
        APPOINTMENT_TRANSITIONS
    }

    fn current(entity: &Appointment) -> AppointmentStatus {
        entity.status
    }

    fn write(entity: &mut Appointment, target: AppointmentStatus, payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        if target == AppointmentStatus::Cancelled {
            entity.cancellation_reason = payload.field("reason").map(String::from);
        }
        entity.updated_at = now;
    }
}

// ============================================================================
// Schedule
// ============================================================================

pub struct ScheduleLifecycle;

const SCHEDULE_TRANSITIONS: &[Transition<ScheduleStatus>] = &[
    Transition::new(ScheduleStatus::Active, ScheduleStatus::Inactive, ADMIN_ONLY, &[]),
    Transition::new(ScheduleStatus::Inactive, ScheduleStatus::Active, ADMIN_ONLY, &[]),
    Transition::new(ScheduleStatus::Active, ScheduleStatus::Cancelled, ADMIN_ONLY, &[]),
    Transition::new(ScheduleStatus::Inactive, ScheduleStatus::Cancelled, ADMIN_ONLY, &[]),
];

impl Lifecycle for ScheduleLifecycle {
    type Entity = Schedule;
    type Status = ScheduleStatus;
    const ENTITY: &'static str = "Schedule";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<ScheduleStatus>] {
        SCHEDULE_TRANSITIONS
    }

    fn current(entity: &Schedule) -> ScheduleStatus {
        entity.status
    }

    fn write(entity: &mut Schedule, target: ScheduleStatus, _payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        entity.updated_at = now;
    }
}

// ============================================================================
// Approval request
// ============================================================================

pub struct ApprovalLifecycle;

const APPROVAL_TRANSITIONS: &[Transition<ApprovalStatus>] = &[
    Transition::new(ApprovalStatus::Pending, ApprovalStatus::Approved, FACULTY, &["response"]),
    Transition::new(ApprovalStatus::Pending, ApprovalStatus::Rejected, FACULTY, &["response"]),
];

impl Lifecycle for ApprovalLifecycle {
    type Entity = ApprovalRequest;
    type Status = ApprovalStatus;
    const ENTITY: &'static str = "ApprovalRequest";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<ApprovalStatus>] {
        APPROVAL_TRANSITIONS
    }

    fn current(entity: &ApprovalRequest) -> ApprovalStatus {
        entity.status
    }

    fn write(entity: &mut ApprovalRequest, target: ApprovalStatus, payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        entity.response = payload.field("response").map(String::from);
        entity.response_date = Some(now);
        entity.updated_at = now;
    }
}

// ============================================================================
// Clinical case: treatment status
// ============================================================================

pub struct CaseStatusLifecycle;

const CASE_STATUS_TRANSITIONS: &[Transition<CaseStatus>] = &[
    Transition::new(CaseStatus::Active, CaseStatus::OnHold, STAFF, &[]),
    Transition::new(CaseStatus::OnHold, CaseStatus::Active, STAFF, &[]),
    Transition::new(CaseStatus::Active, CaseStatus::Completed, FACULTY, &[]),
    Transition::new(CaseStatus::Active, CaseStatus::Cancelled, FACULTY, &["reason"]),
    Transition::new(CaseStatus::OnHold, CaseStatus::Cancelled, FACULTY, &["reason"]),
];

impl Lifecycle for CaseStatusLifecycle {
    type Entity = ClinicalCase;
    type Status = CaseStatus;
    const ENTITY: &'static str = "ClinicalCase";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<CaseStatus>] {
        CASE_STATUS_TRANSITIONS
    }

    fn current(entity: &ClinicalCase) -> CaseStatus {
        entity.status
    }

    fn guard(entity: &ClinicalCase, target: CaseStatus) -> Result<()> {
        if target == CaseStatus::Completed && !entity.sessions_done() {
            return Err(PlatformError::validation(
                "SESSIONS_INCOMPLETE",
                format!(
                    "case has {} of {} sessions completed",
                    entity.sessions_completed, entity.total_sessions
                ),
            ));
        }
        Ok(())
    }

    fn write(entity: &mut ClinicalCase, target: CaseStatus, payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        match target {
            CaseStatus::Completed => {
                entity.progress = 100;
                entity.sessions_completed = entity.total_sessions;
            }
            CaseStatus::Cancelled => {
                entity.cancellation_reason = payload.field("reason").map(String::from);
            }
            _ => {}
        }
        entity.updated_at = now;
    }
}

// ============================================================================
// Clinical case: review
// ============================================================================

pub struct CaseApprovalLifecycle;

const CASE_APPROVAL_TRANSITIONS: &[Transition<CaseApprovalStatus>] = &[
    Transition::new(CaseApprovalStatus::Pending, CaseApprovalStatus::Approved, FACULTY, &[]),
    Transition::new(CaseApprovalStatus::Pending, CaseApprovalStatus::Rejected, FACULTY, &["notes"]),
    Transition::new(CaseApprovalStatus::Pending, CaseApprovalStatus::RevisionNeeded, FACULTY, &["notes"]),
    Transition::new(CaseApprovalStatus::RevisionNeeded, CaseApprovalStatus::Pending, STUDENT_SIDE, &[]),
];

impl Lifecycle for CaseApprovalLifecycle {
    type Entity = ClinicalCase;
    type Status = CaseApprovalStatus;
    const ENTITY: &'static str = "ClinicalCase";
    const FIELD: &'static str = "approvalStatus";

    fn transitions() -> &'static [Transition<CaseApprovalStatus>] {
        CASE_APPROVAL_TRANSITIONS
    }

    fn current(entity: &ClinicalCase) -> CaseApprovalStatus {
        entity.approval_status
    }

    fn write(entity: &mut ClinicalCase, target: CaseApprovalStatus, payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.approval_status = target;
        if target != CaseApprovalStatus::Pending {
            entity.review_notes = payload.field("notes").map(String::from);
        }
        entity.updated_at = now;
    }
}

// ============================================================================
// Academic task
// ============================================================================

pub struct TaskLifecycle;

const TASK_TRANSITIONS: &[Transition<TaskStatus>] = &[
    Transition::new(TaskStatus::Pending, TaskStatus::InProgress, STUDENT_SIDE, &[]),
    Transition::new(TaskStatus::InProgress, TaskStatus::Completed, STUDENT_SIDE, &[]),
    Transition::new(TaskStatus::Pending, TaskStatus::Closed, FACULTY, &[]),
    Transition::new(TaskStatus::InProgress, TaskStatus::Closed, FACULTY, &[]),
    Transition::new(TaskStatus::Completed, TaskStatus::Closed, FACULTY, &[]),
];

impl Lifecycle for TaskLifecycle {
    type Entity = AcademicTask;
    type Status = TaskStatus;
    const ENTITY: &'static str = "AcademicTask";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<TaskStatus>] {
        TASK_TRANSITIONS
    }

    fn current(entity: &AcademicTask) -> TaskStatus {
        entity.status
    }

    fn write(entity: &mut AcademicTask, target: TaskStatus, _payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        if target == TaskStatus::Completed {
            entity.progress = 100;
        }
        entity.updated_at = now;
    }
}

// ============================================================================
// Assignment
// ============================================================================

pub struct AssignmentLifecycle;

const ASSIGNMENT_TRANSITIONS: &[Transition<AssignmentStatus>] = &[
    Transition::new(AssignmentStatus::Draft, AssignmentStatus::Published, FACULTY, &[]),
    Transition::new(AssignmentStatus::Published, AssignmentStatus::Closed, FACULTY, &[]),
];

impl Lifecycle for AssignmentLifecycle {
    type Entity = Assignment;
    type Status = AssignmentStatus;
    const ENTITY: &'static str = "Assignment";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<AssignmentStatus>] {
        ASSIGNMENT_TRANSITIONS
    }

    fn current(entity: &Assignment) -> AssignmentStatus {
        entity.status
    }

    fn write(entity: &mut Assignment, target: AssignmentStatus, _payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        if target == AssignmentStatus::Published {
            entity.published_at = Some(now);
        }
        entity.updated_at = now;
    }
}

// ============================================================================
// Evaluation
// ============================================================================

pub struct EvaluationLifecycle;

const EVALUATION_TRANSITIONS: &[Transition<EvaluationStatus>] = &[Transition::new(
    EvaluationStatus::Pending,
    EvaluationStatus::Completed,
    FACULTY,
    &[],
)];

impl Lifecycle for EvaluationLifecycle {
    type Entity = Evaluation;
    type Status = EvaluationStatus;
    const ENTITY: &'static str = "Evaluation";
    const FIELD: &'static str = "status";

    fn transitions() -> &'static [Transition<EvaluationStatus>] {
        EVALUATION_TRANSITIONS
    }

    fn current(entity: &Evaluation) -> EvaluationStatus {
        entity.status
    }

    fn guard(entity: &Evaluation, _target: EvaluationStatus) -> Result<()> {
        if !entity.all_scored() {
            return Err(PlatformError::validation(
                "UNSCORED_CRITERIA",
                "every criterion must be scored before the evaluation completes",
            ));
        }
        Ok(())
    }

    fn write(entity: &mut Evaluation, target: EvaluationStatus, _payload: &TransitionPayload, now: DateTime<Utc>) {
        entity.status = target;
        entity.completed_at = Some(now);
        entity.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{apply_transition, can_transition};
    use crate::shared::authorization_service::DenyReason;
    use dc_common::Role;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new("stu-1", "pat-1", "prof-1", "Periodontics", "Deep scaling")
    }

    #[test]
    fn test_approval_sets_response_and_date_together() {
        let approved = apply_transition::<ApprovalLifecycle>(
            &request(),
            ApprovalStatus::Approved,
            Role::Professor,
            &TransitionPayload::response("ok"),
        )
        .unwrap();

        assert_eq!(approved.status, ApprovalStatus::Approved);
        assert_eq!(approved.response.as_deref(), Some("ok"));
        assert!(approved.response_date.is_some());
    }

    #[test]
    fn test_approval_without_response_changes_nothing() {
        let original = request();
        let err = apply_transition::<ApprovalLifecycle>(
            &original,
            ApprovalStatus::Rejected,
            Role::Professor,
            &TransitionPayload::none(),
        )
        .unwrap_err();

        assert_eq!(err, PlatformError::missing_field("response"));
        assert!(original.is_pending());
        assert!(original.response.is_none() && original.response_date.is_none());
    }

    #[test]
    fn test_student_cannot_approve() {
        let err = apply_transition::<ApprovalLifecycle>(
            &request(),
            ApprovalStatus::Approved,
            Role::Student,
            &TransitionPayload::response("self-approved"),
        )
        .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::RoleNotPermitted));
    }

    #[test]
    fn test_decided_request_is_terminal() {
        assert!(!can_transition::<ApprovalLifecycle>(
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
            Role::Admin
        ));
    }

    #[test]
    fn test_case_completion_requires_sessions() {
        let mut case = ClinicalCase::new("pat-1", "stu-1", "prof-1", "Crown", "Prosthodontics", 3);
        case.sessions_completed = 2;
        let err = apply_transition::<CaseStatusLifecycle>(
            &case,
            CaseStatus::Completed,
            Role::Professor,
            &TransitionPayload::none(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "SESSIONS_INCOMPLETE");

        case.sessions_completed = 3;
        let done = apply_transition::<CaseStatusLifecycle>(
            &case,
            CaseStatus::Completed,
            Role::Professor,
            &TransitionPayload::none(),
        )
        .unwrap();
        assert_eq!(done.progress, 100);
        assert_eq!(done.status, CaseStatus::Completed);
    }

    #[test]
    fn test_case_cancel_needs_reason() {
        let case = ClinicalCase::new("pat-1", "stu-1", "prof-1", "Crown", "Prosthodontics", 3);
        let err = apply_transition::<CaseStatusLifecycle>(
            &case,
            CaseStatus::Cancelled,
            Role::Admin,
            &TransitionPayload::none(),
        )
        .unwrap_err();
        assert_eq!(err, PlatformError::missing_field("reason"));
    }

    #[test]
    fn test_student_can_pause_but_not_complete_case() {
        assert!(can_transition::<CaseStatusLifecycle>(CaseStatus::Active, CaseStatus::OnHold, Role::Student));
        assert!(!can_transition::<CaseStatusLifecycle>(CaseStatus::Active, CaseStatus::Completed, Role::Student));
    }

    #[test]
    fn test_revision_cycle() {
        let case = ClinicalCase::new("pat-1", "stu-1", "prof-1", "Filling", "Operative", 1);
        let revised = apply_transition::<CaseApprovalLifecycle>(
            &case,
            CaseApprovalStatus::RevisionNeeded,
            Role::Professor,
            &TransitionPayload::notes("redo the x-ray"),
        )
        .unwrap();
        assert_eq!(revised.review_notes.as_deref(), Some("redo the x-ray"));

        let resubmitted = apply_transition::<CaseApprovalLifecycle>(
            &revised,
            CaseApprovalStatus::Pending,
            Role::Student,
            &TransitionPayload::none(),
        )
        .unwrap();
        assert_eq!(resubmitted.approval_status, CaseApprovalStatus::Pending);
        assert_eq!(resubmitted.review_notes.as_deref(), Some("redo the x-ray"));
    }

    #[test]
    fn test_every_role_may_cancel_pending_appointment() {
        for role in Role::ALL {
            assert!(can_transition::<AppointmentLifecycle>(
                AppointmentStatus::Pending,
                AppointmentStatus::Cancelled,
                role
            ));
        }
        assert!(!can_transition::<AppointmentLifecycle>(
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            Role::Patient
        ));
    }

    #[test]
    fn test_schedule_moves_are_admin_only() {
        assert!(can_transition::<ScheduleLifecycle>(ScheduleStatus::Active, ScheduleStatus::Inactive, Role::Admin));
        assert!(!can_transition::<ScheduleLifecycle>(ScheduleStatus::Active, ScheduleStatus::Inactive, Role::Professor));
        assert!(!can_transition::<ScheduleLifecycle>(ScheduleStatus::Cancelled, ScheduleStatus::Active, Role::Admin));
    }

    #[test]
    fn test_task_closing_is_faculty_only() {
        assert!(can_transition::<TaskLifecycle>(TaskStatus::Completed, TaskStatus::Closed, Role::Professor));
        assert!(!can_transition::<TaskLifecycle>(TaskStatus::Completed, TaskStatus::Closed, Role::Student));
        assert!(!can_transition::<TaskLifecycle>(TaskStatus::Closed, TaskStatus::Pending, Role::Admin));
    }
}
