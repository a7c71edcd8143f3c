//! Authorization Gate
//!
//! Role × action rule table with ownership scoping. Pure: no store access,
//! the caller hands in the target's ownership facts.

use std::collections::HashMap;
use std::fmt;

use dc_common::{Actor, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::error::{PlatformError, Result};

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DenyReason {
    /// No rule grants this action to the caller's role.
    RoleNotPermitted,
    /// The action is limited to the record's owner (or its participants).
    NotOwner,
    /// The action is limited to the record's assignee.
    NotAssignee,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::RoleNotPermitted => "RoleNotPermitted",
            DenyReason::NotOwner => "NotOwner",
            DenyReason::NotAssignee => "NotAssignee",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Everything a caller can ask the platform to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    // Appointments
    BookAppointment,
    ReadAppointment,
    ConfirmAppointment,
    CompleteAppointment,
    CancelAppointment,

    // Schedules
    ReadSchedule,
    EnrollSchedule,
    ManageSchedule,

    // Approval requests
    SubmitApprovalRequest,
    ReadApprovalRequest,
    RespondApprovalRequest,
    ReadPendingQueue,

    // Clinical cases
    OpenClinicalCase,
    ReadClinicalCase,
    RecordCaseProgress,
    ReviewClinicalCase,
    ResubmitClinicalCase,
    TransitionClinicalCase,

    // Assignments and academic tasks
    CreateAssignment,
    ReadAssignment,
    PublishAssignment,
    CloseAssignment,
    ReadAcademicTask,
    UpdateTaskProgress,
    GiveTaskFeedback,
    CloseAcademicTask,

    // Evaluations
    CreateEvaluation,
    ReadEvaluation,
    SubmitEvaluationScores,

    // Notifications
    ReadNotifications,
    ManageNotifications,

    // System configuration
    ManageSystemConfig,
}

/// How far a granted action reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Any record, or no record at all (creation).
    Any,
    /// Only records the caller owns.
    Owner,
    /// Only records assigned to the caller.
    Assignee,
    /// Records the caller owns, is assigned to, or takes part in.
    Participant,
}

use Action::*;
use Scope::*;

const PATIENT_RULES: &[(Action, Scope)] = &[
    (BookAppointment, Any),
    (ReadAppointment, Participant),
    (CancelAppointment, Participant),
    (ReadClinicalCase, Participant),
    (ReadNotifications, Owner),
    (ManageNotifications, Owner),
];

const STUDENT_RULES: &[(Action, Scope)] = &[
    (ReadAppointment, Participant),
    (ConfirmAppointment, Assignee),
    (CompleteAppointment, Assignee),
    (CancelAppointment, Participant),
    (ReadSchedule, Any),
    (EnrollSchedule, Any),
    (SubmitApprovalRequest, Any),
    (ReadApprovalRequest, Owner),
    (OpenClinicalCase, Any),
    (ReadClinicalCase, Participant),
    (RecordCaseProgress, Owner),
    (ResubmitClinicalCase, Owner),
    (TransitionClinicalCase, Owner),
    (ReadAssignment, Participant),
    (ReadAcademicTask, Owner),
    (UpdateTaskProgress, Owner),
    (ReadEvaluation, Participant),
    (ReadNotifications, Owner),
    (ManageNotifications, Owner),
];

const PROFESSOR_RULES: &[(Action, Scope)] = &[
    (ReadAppointment, Participant),
    (ConfirmAppointment, Assignee),
    (CompleteAppointment, Assignee),
    (CancelAppointment, Participant),
    (ReadSchedule, Any),
    (ReadApprovalRequest, Assignee),
    (RespondApprovalRequest, Assignee),
    (ReadPendingQueue, Assignee),
    (ReadClinicalCase, Participant),
    (ReviewClinicalCase, Assignee),
    (TransitionClinicalCase, Assignee),
    (CreateAssignment, Any),
    (ReadAssignment, Owner),
    (PublishAssignment, Owner),
    (CloseAssignment, Owner),
    (ReadAcademicTask, Assignee),
    (GiveTaskFeedback, Assignee),
    (CloseAcademicTask, Assignee),
    (CreateEvaluation, Any),
    (ReadEvaluation, Participant),
    (SubmitEvaluationScores, Owner),
    (ReadNotifications, Owner),
    (ManageNotifications, Owner),
];

/// Ownership facts about the record an action touches.
#[derive(Debug, Clone, Default)]
pub struct Target<'a> {
    pub owner_id: Option<&'a str>,
    pub assignee_id: Option<&'a str>,
    pub participant_ids: Vec<&'a str>,
}

impl<'a> Target<'a> {
    /// No record: creation and other unscoped actions.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: &'a str) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn assigned_to(assignee_id: &'a str) -> Self {
        Self {
            assignee_id: Some(assignee_id),
            ..Self::default()
        }
    }

    fn involves(&self, id: &str) -> bool {
        self.owner_id == Some(id)
            || self.assignee_id == Some(id)
            || self.participant_ids.iter().any(|p| *p == id)
    }
}

/// Records that can be checked by the gate.
pub trait Governed {
    fn target(&self) -> Target<'_>;
}

/// Authorization gate over the declarative rule table.
pub struct AuthorizationGate {
    rules: HashMap<(Role, Action), Scope>,
}

impl AuthorizationGate {
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        for (role, table) in [
            (Role::Patient, PATIENT_RULES),
            (Role::Student, STUDENT_RULES),
            (Role::Professor, PROFESSOR_RULES),
        ] {
            for (action, scope) in table {
                rules.insert((role, *action), *scope);
            }
        }
        Self { rules }
    }

    /// Decide whether `actor` may perform `action` on `target`.
    ///
    /// Admins are granted every action with [`Scope::Any`].
    pub fn authorize(&self, actor: &Actor, action: Action, target: &Target<'_>) -> Decision {
        if actor.is_admin() {
            return Decision::Allow;
        }

        let scope = match self.rules.get(&(actor.role, action)) {
            Some(scope) => *scope,
            None => return Decision::Deny(DenyReason::RoleNotPermitted),
        };

        let id = actor.id.as_str();
        match scope {
            Any => Decision::Allow,
            Owner if target.owner_id == Some(id) => Decision::Allow,
            Owner => Decision::Deny(DenyReason::NotOwner),
            Assignee if target.assignee_id == Some(id) => Decision::Allow,
            Assignee => Decision::Deny(DenyReason::NotAssignee),
            Participant if target.involves(id) => Decision::Allow,
            Participant => Decision::Deny(DenyReason::NotOwner),
        }
    }

    /// [`authorize`](Self::authorize), turning a deny into `Forbidden`.
    pub fn require(&self, actor: &Actor, action: Action, target: &Target<'_>) -> Result<()> {
        match self.authorize(actor, action, target) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::debug!(actor = %actor, ?action, %reason, "Authorization denied");
                Err(PlatformError::forbidden(
                    reason,
                    format!("{} may not perform {:?}", actor.role, action),
                ))
            }
        }
    }

    pub fn require_on<G: Governed>(&self, actor: &Actor, action: Action, record: &G) -> Result<()> {
        self.require(actor, action, &record.target())
    }

    /// Whether the role holds `action` at all, ignoring record scope.
    pub fn role_may(&self, role: Role, action: Action) -> bool {
        role == Role::Admin || self.rules.contains_key(&(role, action))
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new()
    }

    #[test]
    fn test_admin_allowed_everything() {
        let admin = Actor::admin("root");
        for action in [ManageSchedule, ManageSystemConfig, RespondApprovalRequest, ReadPendingQueue] {
            assert!(gate().authorize(&admin, action, &Target::assigned_to("prof-9")).is_allowed());
        }
    }

    #[test]
    fn test_patient_cannot_respond_to_approvals() {
        let patient = Actor::patient("pat-1");
        let decision = gate().authorize(&patient, RespondApprovalRequest, &Target::assigned_to("pat-1"));
        assert_eq!(decision, Decision::Deny(DenyReason::RoleNotPermitted));
    }

    #[test]
    fn test_professor_must_be_assignee() {
        let target = Target {
            owner_id: Some("stu-1"),
            assignee_id: Some("prof-1"),
            participant_ids: vec![],
        };
        assert!(gate().authorize(&Actor::professor("prof-1"), RespondApprovalRequest, &target).is_allowed());
        assert_eq!(
            gate().authorize(&Actor::professor("prof-2"), RespondApprovalRequest, &target),
            Decision::Deny(DenyReason::NotAssignee)
        );
    }

    #[test]
    fn test_cross_professor_queue_read_denied() {
        let queue_of_prof_1 = Target::assigned_to("prof-1");
        assert_eq!(
            gate().authorize(&Actor::professor("prof-2"), ReadPendingQueue, &queue_of_prof_1),
            Decision::Deny(DenyReason::NotAssignee)
        );
    }

    #[test]
    fn test_owner_scope() {
        let target = Target::owned_by("stu-1");
        assert!(gate().authorize(&Actor::student("stu-1"), UpdateTaskProgress, &target).is_allowed());
        assert_eq!(
            gate().authorize(&Actor::student("stu-2"), UpdateTaskProgress, &target),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn test_participant_scope_includes_listed_ids() {
        let target = Target {
            owner_id: Some("stu-1"),
            assignee_id: Some("prof-1"),
            participant_ids: vec!["pat-1"],
        };
        assert!(gate().authorize(&Actor::patient("pat-1"), ReadClinicalCase, &target).is_allowed());
        assert!(!gate().authorize(&Actor::patient("pat-2"), ReadClinicalCase, &target).is_allowed());
    }

    #[test]
    fn test_schedule_management_is_admin_only() {
        for actor in [Actor::patient("p"), Actor::student("s"), Actor::professor("f")] {
            assert_eq!(
                gate().authorize(&actor, ManageSchedule, &Target::none()),
                Decision::Deny(DenyReason::RoleNotPermitted)
            );
        }
    }

    #[test]
    fn test_require_maps_to_forbidden() {
        let err = gate()
            .require(&Actor::patient("p"), ManageSystemConfig, &Target::none())
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::RoleNotPermitted));
    }

    #[test]
    fn test_scoped_rule_without_record_is_denied() {
        assert_eq!(
            gate().authorize(&Actor::student("s"), ReadApprovalRequest, &Target::none()),
            Decision::Deny(DenyReason::NotOwner)
        );
    }
}
