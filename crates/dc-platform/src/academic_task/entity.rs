//! Academic Task Entity

use chrono::{DateTime, NaiveDate, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};

use crate::lifecycle::TaskStatus;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// One student's piece of coursework, usually fanned out from an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicTask {
    pub id: String,
    pub student_id: String,
    /// Reviewer who gives feedback and closes the task
    pub professor_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,

    pub title: String,
    pub description: String,
    pub specialty: String,
    pub due_date: NaiveDate,

    pub status: TaskStatus,
    /// Percent complete, 0-100
    pub progress: u8,

    /// Only present once work has started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicTask {
    pub fn new(
        student_id: impl Into<String>,
        professor_id: impl Into<String>,
        title: impl Into<String>,
        specialty: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            student_id: student_id.into(),
            professor_id: professor_id.into(),
            assignment_id: None,
            title: title.into(),
            description: String::new(),
            specialty: specialty.into(),
            due_date,
            status: TaskStatus::Pending,
            progress: 0,
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_assignment(mut self, assignment_id: impl Into<String>) -> Self {
        self.assignment_id = Some(assignment_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Entity for AcademicTask {
    const KIND: EntityKind = EntityKind::AcademicTask;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!("{} (due {})", self.title, self.due_date)
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.student_id, Role::Student))
            .with_assignee(Recipient::new(&self.professor_id, Role::Professor))
    }
}

impl StoredEntity for AcademicTask {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.tasks.as_ref()
    }
}

impl Governed for AcademicTask {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.student_id),
            assignee_id: Some(&self.professor_id),
            participant_ids: vec![],
        }
    }
}
