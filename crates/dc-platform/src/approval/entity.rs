//! Approval Request Entity

use chrono::{DateTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};

use crate::lifecycle::ApprovalStatus;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// A student's request to treat a patient, answered by a professor.
///
/// Once the request leaves `pending`, `response` and `response_date` are
/// both set; they are only ever written together with the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: String,
    pub student_id: String,
    pub patient_id: String,
    /// Assigned reviewer
    pub professor_id: String,
    pub specialty: String,
    pub description: String,

    /// Opaque file references
    #[serde(default)]
    pub attachments: Vec<String>,

    pub status: ApprovalStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn new(
        student_id: impl Into<String>,
        patient_id: impl Into<String>,
        professor_id: impl Into<String>,
        specialty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            student_id: student_id.into(),
            patient_id: patient_id.into(),
            professor_id: professor_id.into(),
            specialty: specialty.into(),
            description: description.into(),
            attachments: Vec::new(),
            status: ApprovalStatus::Pending,
            response: None,
            response_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

impl Entity for ApprovalRequest {
    const KIND: EntityKind = EntityKind::ApprovalRequest;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        format!("{} request for patient {}", self.specialty, self.patient_id)
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.student_id, Role::Student))
            .with_assignee(Recipient::new(&self.professor_id, Role::Professor))
    }
}

impl StoredEntity for ApprovalRequest {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.approvals.as_ref()
    }
}

impl Governed for ApprovalRequest {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.student_id),
            assignee_id: Some(&self.professor_id),
            participant_ids: vec![],
        }
    }
}
