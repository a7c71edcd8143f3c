//! Entity Store
//!
//! Canonical records for every workflow entity, one repository per type.
//! Pure data: no validation, no authorization, no I/O.

pub mod event_log;
pub mod record_lock;
pub mod repository;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::academic_task::entity::AcademicTask;
use crate::appointment::entity::Appointment;
use crate::approval::entity::ApprovalRequest;
use crate::assignment::entity::Assignment;
use crate::clinical_case::entity::ClinicalCase;
use crate::evaluation::entity::Evaluation;
use crate::notification::entity::Notification;
use crate::schedule::entity::Schedule;
use crate::usecase::domain_event::Audience;

pub use event_log::EventLog;
pub use record_lock::RecordLocks;
pub use repository::{InMemoryRepository, Repository};

/// The kinds of record the store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Appointment,
    Schedule,
    ApprovalRequest,
    ClinicalCase,
    AcademicTask,
    Assignment,
    Evaluation,
    Notification,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Appointment => "appointment",
            EntityKind::Schedule => "schedule",
            EntityKind::ApprovalRequest => "approval-request",
            EntityKind::ClinicalCase => "clinical-case",
            EntityKind::AcademicTask => "academic-task",
            EntityKind::Assignment => "assignment",
            EntityKind::Evaluation => "evaluation",
            EntityKind::Notification => "notification",
        }
    }

    /// Name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Appointment => "Appointment",
            EntityKind::Schedule => "Schedule",
            EntityKind::ApprovalRequest => "ApprovalRequest",
            EntityKind::ClinicalCase => "ClinicalCase",
            EntityKind::AcademicTask => "AcademicTask",
            EntityKind::Assignment => "Assignment",
            EntityKind::Evaluation => "Evaluation",
            EntityKind::Notification => "Notification",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record with an id that can be described to the people attached to it.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// One-line description used in notification text.
    fn summary(&self) -> String;

    /// Owner, assignee and other people attached to the record.
    fn audience(&self) -> Audience;
}

/// An entity with a home in the [`EntityStore`].
pub trait StoredEntity: Entity {
    fn repository(store: &EntityStore) -> &dyn Repository<Self>;
}

/// One repository per entity type.
pub struct EntityStore {
    pub appointments: Arc<dyn Repository<Appointment>>,
    pub schedules: Arc<dyn Repository<Schedule>>,
    pub approvals: Arc<dyn Repository<ApprovalRequest>>,
    pub cases: Arc<dyn Repository<ClinicalCase>>,
    pub tasks: Arc<dyn Repository<AcademicTask>>,
    pub assignments: Arc<dyn Repository<Assignment>>,
    pub evaluations: Arc<dyn Repository<Evaluation>>,
    pub notifications: Arc<dyn Repository<Notification>>,
    pub locks: RecordLocks,
}

impl EntityStore {
    pub fn in_memory() -> Self {
        Self {
            appointments: Arc::new(InMemoryRepository::new()),
            schedules: Arc::new(InMemoryRepository::new()),
            approvals: Arc::new(InMemoryRepository::new()),
            cases: Arc::new(InMemoryRepository::new()),
            tasks: Arc::new(InMemoryRepository::new()),
            assignments: Arc::new(InMemoryRepository::new()),
            evaluations: Arc::new(InMemoryRepository::new()),
            notifications: Arc::new(InMemoryRepository::new()),
            locks: RecordLocks::new(),
        }
    }

    pub fn repository<T: StoredEntity>(&self) -> &dyn Repository<T> {
        T::repository(self)
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::domain_event::Recipient;
    use dc_common::Role;

    #[derive(Debug, Clone, PartialEq)]
    struct Memo {
        id: String,
        text: String,
    }

    impl Entity for Memo {
        const KIND: EntityKind = EntityKind::Notification;

        fn id(&self) -> &str {
            &self.id
        }

        fn summary(&self) -> String {
            self.text.clone()
        }

        fn audience(&self) -> Audience {
            Audience::new(Recipient::new("someone", Role::Student))
        }
    }

    fn memo(id: &str, text: &str) -> Memo {
        Memo {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_save_is_upsert() {
        let repo = InMemoryRepository::new();
        repo.save(&memo("m1", "first")).unwrap();
        repo.save(&memo("m1", "second")).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.find_by_id("m1").unwrap().unwrap().text, "second");
    }

    #[test]
    fn test_find_all_keeps_insertion_order() {
        let repo = InMemoryRepository::new();
        for id in ["c", "a", "b"] {
            repo.save(&memo(id, id)).unwrap();
        }
        let ids: Vec<String> = repo.find_all().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_require_missing_is_not_found() {
        let repo: InMemoryRepository<Memo> = InMemoryRepository::new();
        let err = repo.require("nope").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_delete_and_filter() {
        let repo = InMemoryRepository::new();
        repo.save(&memo("m1", "keep")).unwrap();
        repo.save(&memo("m2", "drop")).unwrap();

        assert!(repo.delete("m2").unwrap());
        assert!(!repo.delete("m2").unwrap());

        let kept = repo.find_where(&|m: &Memo| m.text == "keep").unwrap();
        assert_eq!(kept.len(), 1);
        assert!(!repo.exists("m2").unwrap());
    }
}
