//! Notification Emitter
//!
//! Turns committed workflow events into notifications. Which change reaches
//! whom is declared once in [`TEMPLATES`]; events without a template produce
//! nothing.

use std::sync::Arc;
use tracing::debug;

use crate::notification::entity::{Notification, NotificationType, Priority};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{Change, DomainEvent, Recipient, WorkflowEvent};

/// Which change a template reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Created,
    /// Lifecycle field moved to the given status
    Moved { field: &'static str, to: &'static str },
    /// The named field was updated
    Updated(&'static str),
}

impl Trigger {
    fn matches(&self, change: &Change) -> bool {
        match (self, change) {
            (Trigger::Created, Change::Created) => true,
            (Trigger::Moved { field, to }, Change::Transitioned { field: f, to: t, .. }) => {
                *field == f.as_str() && *to == t.as_str()
            }
            (Trigger::Updated(field), Change::Updated { fields }) => fields.iter().any(|f| f.as_str() == *field),
            _ => false,
        }
    }
}

/// Part of an entity's audience a template addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Owner,
    Assignee,
    Participants,
    Cohort,
}

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub kind: EntityKind,
    pub trigger: Trigger,
    pub reach: &'static [Reach],
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: &'static str,
    /// `{subject}` is replaced by the entity summary
    pub message: &'static str,
}

const fn template(
    kind: EntityKind,
    trigger: Trigger,
    reach: &'static [Reach],
    notification_type: NotificationType,
    priority: Priority,
    title: &'static str,
    message: &'static str,
) -> Template {
    Template {
        kind,
        trigger,
        reach,
        notification_type,
        priority,
        title,
        message,
    }
}

const fn status(to: &'static str) -> Trigger {
    Trigger::Moved { field: "status", to }
}

use EntityKind as K;
use NotificationType as N;
use Reach::*;

#[rustfmt::skip]
pub const TEMPLATES: &[Template] = &[
    // Approval requests
    template(K::ApprovalRequest, Trigger::Created, &[Assignee], N::Approval, Priority::High,
        "New approval request", "{subject} is waiting for your decision"),
    template(K::ApprovalRequest, status("approved"), &[Owner], N::Approval, Priority::High,
        "Approval request approved", "Your {subject} was approved"),
    template(K::ApprovalRequest, status("rejected"), &[Owner], N::Approval, Priority::High,
        "Approval request rejected", "Your {subject} was rejected"),
    // Appointments
    template(K::Appointment, Trigger::Created, &[Assignee], N::Appointment, Priority::Medium,
        "New appointment", "A patient booked a {subject}"),
    template(K::Appointment, status("confirmed"), &[Owner], N::Appointment, Priority::Medium,
        "Appointment confirmed", "Your {subject} is confirmed"),
    template(K::Appointment, status("cancelled"), &[Owner, Assignee], N::Appointment, Priority::High,
        "Appointment cancelled", "The {subject} was cancelled"),
    // Clinical cases
    template(K::ClinicalCase, Trigger::Moved { field: "approvalStatus", to: "approved" }, &[Owner], N::Case, Priority::High,
        "Case approved", "Your {subject} was approved"),
    template(K::ClinicalCase, Trigger::Moved { field: "approvalStatus", to: "rejected" }, &[Owner], N::Case, Priority::High,
        "Case rejected", "Your {subject} was rejected"),
    template(K::ClinicalCase, Trigger::Moved { field: "approvalStatus", to: "revision-needed" }, &[Owner], N::Case, Priority::High,
        "Case needs revision", "Your {subject} needs changes before approval"),
    template(K::ClinicalCase, Trigger::Moved { field: "approvalStatus", to: "pending" }, &[Assignee], N::Case, Priority::Medium,
        "Case resubmitted", "{subject} is ready for another review"),
    template(K::ClinicalCase, status("completed"), &[Owner, Participants], N::Case, Priority::Medium,
        "Treatment completed", "The {subject} is complete"),
    // Assignments and tasks
    template(K::Assignment, status("published"), &[Cohort], N::Assignment, Priority::Medium,
        "New assignment", "{subject} has been assigned to you"),
    template(K::AcademicTask, status("completed"), &[Assignee], N::Task, Priority::Medium,
        "Task completed", "{subject} was completed"),
    template(K::AcademicTask, Trigger::Updated("feedback"), &[Owner], N::Task, Priority::Medium,
        "New feedback", "Your professor left feedback on {subject}"),
    // Evaluations
    template(K::Evaluation, status("completed"), &[Participants], N::Evaluation, Priority::High,
        "Evaluation completed", "Your evaluation '{subject}' has been graded"),
    // Schedules
    template(K::Schedule, status("cancelled"), &[Assignee], N::Schedule, Priority::High,
        "Schedule cancelled", "{subject} was cancelled"),
];

/// Templates matching an event, in declaration order.
pub fn templates_for(event: &WorkflowEvent) -> impl Iterator<Item = &'static Template> + '_ {
    TEMPLATES
        .iter()
        .filter(move |t| t.kind == event.entity_kind && t.trigger.matches(&event.change))
}

pub struct NotificationEmitter {
    store: Arc<EntityStore>,
    enabled: bool,
}

impl NotificationEmitter {
    pub fn new(store: Arc<EntityStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Notifications an event produces. The person who caused the change is
    /// never told about it, and nobody is told twice about one event.
    pub fn on_transition(&self, event: &WorkflowEvent) -> Vec<Notification> {
        let mut out: Vec<Notification> = Vec::new();

        for template in templates_for(event) {
            let message = template.message.replace("{subject}", &event.summary);

            for recipient in recipients(event, template.reach) {
                if recipient.id == event.principal_id() {
                    continue;
                }
                if out.iter().any(|n| n.recipient_id == recipient.id) {
                    continue;
                }
                out.push(Notification::new(
                    recipient,
                    event.entity_kind,
                    &event.entity_id,
                    template.notification_type,
                    template.priority,
                    template.title,
                    &message,
                ));
            }
        }

        out
    }

    /// Build and store the notifications for a committed event.
    pub fn emit(&self, event: &WorkflowEvent) -> Result<Vec<Notification>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let notifications = self.on_transition(event);
        for notification in &notifications {
            self.store.notifications.save(notification)?;
        }

        if !notifications.is_empty() {
            debug!(
                event_type = event.event_type(),
                entity_id = %event.entity_id,
                count = notifications.len(),
                "Notifications emitted"
            );
        }
        Ok(notifications)
    }
}

fn recipients<'a>(event: &'a WorkflowEvent, reach: &[Reach]) -> Vec<&'a Recipient> {
    let audience = &event.audience;
    let mut out = Vec::new();
    for part in reach {
        match part {
            Owner => out.extend(audience.owner.iter()),
            Assignee => out.extend(audience.assignee.iter()),
            Participants => out.extend(audience.participants.iter()),
            Cohort => out.extend(audience.cohort.iter()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::entity::ApprovalRequest;
    use crate::assignment::entity::Assignment;
    use crate::lifecycle::{AppointmentStatus, ApprovalStatus};
    use crate::appointment::entity::Appointment;
    use crate::scheduling::TimeSlot;
    use crate::store::Repository;
    use crate::usecase::ExecutionContext;
    use chrono::{NaiveDate, NaiveTime};
    use dc_common::{Actor, Role};

    fn emitter() -> (Arc<EntityStore>, NotificationEmitter) {
        let store = Arc::new(EntityStore::in_memory());
        (store.clone(), NotificationEmitter::new(store, true))
    }

    fn request() -> ApprovalRequest {
        ApprovalRequest::new("stu-1", "pat-1", "prof-1", "Periodontics", "Deep scaling")
    }

    #[test]
    fn test_submitted_request_notifies_professor() {
        let (_, emitter) = emitter();
        let ctx = ExecutionContext::create(Actor::student("stu-1"));
        let event = WorkflowEvent::created(&ctx, &request());

        let notes = emitter.on_transition(&event);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient_id, "prof-1");
        assert_eq!(notes[0].recipient_role, Role::Professor);
        assert_eq!(notes[0].priority, Priority::High);
        assert!(notes[0].message.contains("Periodontics request for patient pat-1"));
    }

    #[test]
    fn test_approved_request_notifies_student() {
        let (store, emitter) = emitter();
        let ctx = ExecutionContext::create(Actor::professor("prof-1"));
        let mut approved = request();
        approved.status = ApprovalStatus::Approved;
        let event = WorkflowEvent::transitioned(&ctx, &approved, "status", ApprovalStatus::Pending, ApprovalStatus::Approved);

        let notes = emitter.emit(&event).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient_id, "stu-1");
        assert_eq!(notes[0].title, "Approval request approved");
        assert_eq!(store.notifications.count().unwrap(), 1);
    }

    #[test]
    fn test_cancel_skips_the_actor() {
        let (_, emitter) = emitter();
        let slot = TimeSlot {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        let appointment = Appointment::new("pat-1", "stu-7", Role::Student, "Orthodontics", slot);
        let ctx = ExecutionContext::create(Actor::patient("pat-1"));
        let event = WorkflowEvent::transitioned(
            &ctx,
            &appointment,
            "status",
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled,
        );

        let ids: Vec<String> = emitter.on_transition(&event).into_iter().map(|n| n.recipient_id).collect();
        assert_eq!(ids, vec!["stu-7"]);
    }

    #[test]
    fn test_published_assignment_reaches_cohort() {
        let (_, emitter) = emitter();
        let assignment = Assignment::new(
            "prof-1",
            "Crown prep",
            "Prosthodontics",
            vec!["stu-1".into(), "stu-2".into(), "stu-3".into()],
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        );
        let ctx = ExecutionContext::create(Actor::professor("prof-1"));
        let event = WorkflowEvent::transitioned(&ctx, &assignment, "status", "draft", "published");

        let notes = emitter.on_transition(&event);
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|n| n.notification_type == NotificationType::Assignment));
    }

    #[test]
    fn test_unmapped_event_and_disabled_emitter_are_silent() {
        let store = Arc::new(EntityStore::in_memory());
        let ctx = ExecutionContext::create(Actor::professor("prof-1"));
        let event = WorkflowEvent::updated(&ctx, &request(), &["description"]);

        assert!(NotificationEmitter::new(store.clone(), true).on_transition(&event).is_empty());

        let created = WorkflowEvent::created(&ctx, &request());
        assert!(NotificationEmitter::new(store.clone(), false).emit(&created).unwrap().is_empty());
        assert_eq!(store.notifications.count().unwrap(), 0);
    }
}
