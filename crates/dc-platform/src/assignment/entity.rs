//! Assignment Entity

use chrono::{DateTime, NaiveDate, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};

use crate::academic_task::entity::AcademicTask;
use crate::lifecycle::AssignmentStatus;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// Coursework a professor hands to a cohort of students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub professor_id: String,
    pub title: String,
    pub description: String,
    pub specialty: String,

    /// Student ids the assignment targets
    pub cohort: Vec<String>,

    pub due_date: NaiveDate,
    pub status: AssignmentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        professor_id: impl Into<String>,
        title: impl Into<String>,
        specialty: impl Into<String>,
        cohort: Vec<String>,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            professor_id: professor_id.into(),
            title: title.into(),
            description: String::new(),
            specialty: specialty.into(),
            cohort,
            due_date,
            status: AssignmentStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// One task per cohort student.
    pub fn fan_out(&self) -> Vec<AcademicTask> {
        self.cohort
            .iter()
            .map(|student_id| {
                AcademicTask::new(
                    student_id,
                    &self.professor_id,
                    &self.title,
                    &self.specialty,
                    self.due_date,
                )
                .with_assignment(&self.id)
                .with_description(&self.description)
            })
            .collect()
    }
}

impl Entity for Assignment {
    const KIND: EntityKind = EntityKind::Assignment;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!("{} (due {})", self.title, self.due_date)
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.professor_id, Role::Professor)).with_cohort(
            self.cohort
                .iter()
                .map(|s| Recipient::new(s, Role::Student))
                .collect(),
        )
    }
}

impl StoredEntity for Assignment {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.assignments.as_ref()
    }
}

impl Governed for Assignment {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.professor_id),
            assignee_id: None,
            participant_ids: self.cohort.iter().map(String::as_str).collect(),
        }
    }
}
