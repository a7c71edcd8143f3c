//! Clinical Case Entity

use chrono::{DateTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};

use crate::lifecycle::{CaseApprovalStatus, CaseStatus};
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// A patient's treatment carried out by a student under a professor.
///
/// Two lifecycles run side by side: `status` tracks the treatment,
/// `approval_status` tracks the professor's review of the student's work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalCase {
    pub id: String,
    pub patient_id: String,
    pub student_id: String,
    pub professor_id: String,
    pub treatment: String,
    pub specialty: String,

    /// Percent complete, 0-100
    pub progress: u8,
    pub sessions_completed: u32,
    pub total_sessions: u32,

    pub status: CaseStatus,
    pub approval_status: CaseApprovalStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClinicalCase {
    pub fn new(
        patient_id: impl Into<String>,
        student_id: impl Into<String>,
        professor_id: impl Into<String>,
        treatment: impl Into<String>,
        specialty: impl Into<String>,
        total_sessions: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            patient_id: patient_id.into(),
            student_id: student_id.into(),
            professor_id: professor_id.into(),
            treatment: treatment.into(),
            specialty: specialty.into(),
            progress: 0,
            sessions_completed: 0,
            total_sessions,
            status: CaseStatus::Active,
            approval_status: CaseApprovalStatus::Pending,
            review_notes: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sessions_done(&self) -> bool {
        self.sessions_completed >= self.total_sessions
    }
}

impl Entity for ClinicalCase {
    const KIND: EntityKind = EntityKind::ClinicalCase;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!("{} case ({})", self.treatment, self.specialty)
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.student_id, Role::Student))
            .with_assignee(Recipient::new(&self.professor_id, Role::Professor))
            .with_participant(Recipient::new(&self.patient_id, Role::Patient))
    }
}

impl StoredEntity for ClinicalCase {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.cases.as_ref()
    }
}

impl Governed for ClinicalCase {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.student_id),
            assignee_id: Some(&self.professor_id),
            participant_ids: vec![self.patient_id.as_str()],
        }
    }
}
