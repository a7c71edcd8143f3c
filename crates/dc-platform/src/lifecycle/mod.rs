//! Status State Machine
//!
//! One fixed transition table per lifecycle and a generic validator shared by
//! all of them. A transition is computed on a copy of the entity; callers
//! commit the returned value as a single write.

pub mod status;
pub mod tables;

use chrono::{DateTime, Utc};
use dc_common::Role;
use std::fmt;

use crate::shared::authorization_service::DenyReason;
use crate::shared::error::{PlatformError, Result};

pub use status::{
    AppointmentStatus, ApprovalStatus, AssignmentStatus, CaseApprovalStatus, CaseStatus,
    EvaluationStatus, ScheduleStatus, TaskStatus,
};
pub use tables::{
    AppointmentLifecycle, ApprovalLifecycle, AssignmentLifecycle, CaseApprovalLifecycle,
    CaseStatusLifecycle, EvaluationLifecycle, ScheduleLifecycle, TaskLifecycle,
};

pub const ALL_ROLES: &[Role] = &Role::ALL;
pub const STAFF: &[Role] = &[Role::Student, Role::Professor, Role::Admin];
pub const FACULTY: &[Role] = &[Role::Professor, Role::Admin];
pub const STUDENT_SIDE: &[Role] = &[Role::Student, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// One declared move of a lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Transition<S: 'static> {
    pub from: S,
    pub to: S,
    /// Roles allowed to perform the move
    pub roles: &'static [Role],
    /// Payload fields that must be present and non-blank
    pub requires: &'static [&'static str],
}

impl<S: Copy + 'static> Transition<S> {
    pub const fn new(from: S, to: S, roles: &'static [Role], requires: &'static [&'static str]) -> Self {
        Self { from, to, roles, requires }
    }
}

/// Extra input a transition may need.
#[derive(Debug, Clone, Default)]
pub struct TransitionPayload {
    pub response: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl TransitionPayload {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn response(value: impl Into<String>) -> Self {
        Self {
            response: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn reason(value: impl Into<String>) -> Self {
        Self {
            reason: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn notes(value: impl Into<String>) -> Self {
        Self {
            notes: Some(value.into()),
            ..Self::default()
        }
    }

    /// A named field, trimmed. Blank counts as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "response" => self.response.as_deref(),
            "reason" => self.reason.as_deref(),
            "notes" => self.notes.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// A status lifecycle over one entity field.
pub trait Lifecycle {
    type Entity: Clone;
    type Status: Copy + Eq + fmt::Display + fmt::Debug + 'static;

    /// Entity name used in errors
    const ENTITY: &'static str;
    /// Field the lifecycle moves, as it appears in events
    const FIELD: &'static str;

    fn transitions() -> &'static [Transition<Self::Status>];

    fn current(entity: &Self::Entity) -> Self::Status;

    /// Preconditions on the entity beyond the table.
    fn guard(_entity: &Self::Entity, _target: Self::Status) -> Result<()> {
        Ok(())
    }

    /// Write the new status and the fields that move with it.
    fn write(entity: &mut Self::Entity, target: Self::Status, payload: &TransitionPayload, now: DateTime<Utc>);
}

pub fn find_transition<L: Lifecycle>(
    from: L::Status,
    to: L::Status,
) -> Option<&'static Transition<L::Status>> {
    L::transitions().iter().find(|t| t.from == from && t.to == to)
}

/// Whether `role` may move a `current` record to `target`.
pub fn can_transition<L: Lifecycle>(current: L::Status, target: L::Status, role: Role) -> bool {
    find_transition::<L>(current, target).is_some_and(|t| t.roles.contains(&role))
}

/// Statuses `role` may move a `current` record to.
pub fn allowed_targets<L: Lifecycle>(current: L::Status, role: Role) -> Vec<L::Status> {
    L::transitions()
        .iter()
        .filter(|t| t.from == current && t.roles.contains(&role))
        .map(|t| t.to)
        .collect()
}

/// Table, role and payload checks for a move.
pub fn check_transition<L: Lifecycle>(
    current: L::Status,
    target: L::Status,
    role: Role,
    payload: &TransitionPayload,
) -> Result<()> {
    let transition = find_transition::<L>(current, target)
        .ok_or_else(|| PlatformError::invalid_transition(L::ENTITY, current, target))?;

    if !transition.roles.contains(&role) {
        return Err(PlatformError::forbidden(
            DenyReason::RoleNotPermitted,
            format!("{} may not move {} from {} to {}", role, L::ENTITY, current, target),
        ));
    }

    if let Some(missing) = transition.requires.iter().find(|f| payload.field(f).is_none()) {
        return Err(PlatformError::missing_field(*missing));
    }

    Ok(())
}

/// Validate and apply a move, returning the updated copy.
///
/// The input entity is never modified; on error nothing changes.
pub fn apply_transition<L: Lifecycle>(
    entity: &L::Entity,
    target: L::Status,
    role: Role,
    payload: &TransitionPayload,
) -> Result<L::Entity> {
    check_transition::<L>(L::current(entity), target, role, payload)?;
    L::guard(entity, target)?;

    let mut next = entity.clone();
    L::write(&mut next, target, payload, Utc::now());
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Shut,
        Open,
        Locked,
    }

    impl fmt::Display for Door {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    #[derive(Debug, Clone)]
    struct Room {
        door: Door,
        note: Option<String>,
        touched: Option<DateTime<Utc>>,
    }

    struct DoorLifecycle;

    const DOOR_TRANSITIONS: &[Transition<Door>] = &[
        Transition::new(Door::Shut, Door::Open, ALL_ROLES, &[]),
        Transition::new(Door::Open, Door::Shut, ALL_ROLES, &[]),
        Transition::new(Door::Shut, Door::Locked, ADMIN_ONLY, &["notes"]),
    ];

    impl Lifecycle for DoorLifecycle {
        type Entity = Room;
        type Status = Door;
        const ENTITY: &'static str = "Room";
        const FIELD: &'static str = "door";

        fn transitions() -> &'static [Transition<Door>] {
            DOOR_TRANSITIONS
        }

        fn current(entity: &Room) -> Door {
            entity.door
        }

        fn write(entity: &mut Room, target: Door, payload: &TransitionPayload, now: DateTime<Utc>) {
            entity.door = target;
            entity.note = payload.field("notes").map(String::from);
            entity.touched = Some(now);
        }
    }

    fn room() -> Room {
        Room {
            door: Door::Shut,
            note: None,
            touched: None,
        }
    }

    #[test]
    fn test_undeclared_move_is_invalid() {
        let err = apply_transition::<DoorLifecycle>(&room(), Door::Shut, Role::Admin, &TransitionPayload::none())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_role_outside_list_is_forbidden() {
        let err = apply_transition::<DoorLifecycle>(
            &room(),
            Door::Locked,
            Role::Student,
            &TransitionPayload::notes("fire drill"),
        )
        .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::RoleNotPermitted));
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let err = apply_transition::<DoorLifecycle>(&room(), Door::Locked, Role::Admin, &TransitionPayload::notes("  "))
            .unwrap_err();
        assert_eq!(err, PlatformError::missing_field("notes"));
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let before = room();
        let after = apply_transition::<DoorLifecycle>(
            &before,
            Door::Locked,
            Role::Admin,
            &TransitionPayload::notes(" closing "),
        )
        .unwrap();

        assert_eq!(before.door, Door::Shut);
        assert!(before.touched.is_none());
        assert_eq!(after.door, Door::Locked);
        assert_eq!(after.note.as_deref(), Some("closing"));
        assert!(after.touched.is_some());
    }

    #[test]
    fn test_can_transition_and_targets() {
        assert!(can_transition::<DoorLifecycle>(Door::Shut, Door::Open, Role::Patient));
        assert!(!can_transition::<DoorLifecycle>(Door::Shut, Door::Locked, Role::Professor));
        assert!(!can_transition::<DoorLifecycle>(Door::Locked, Door::Open, Role::Admin));
        assert_eq!(
            allowed_targets::<DoorLifecycle>(Door::Shut, Role::Admin),
            vec![Door::Open, Door::Locked]
        );
    }
}
