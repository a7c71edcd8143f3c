//! Notification Entity

use chrono::{DateTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Approval,
    Appointment,
    Case,
    Assignment,
    Task,
    Evaluation,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A message for one recipient about a committed change.
///
/// Created only by the emitter. The recipient may toggle `is_read` or delete
/// it; nothing else changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_role: Role,
    pub recipient_id: String,
    pub source_kind: EntityKind,
    pub source_id: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub is_read: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: &Recipient,
        source_kind: EntityKind,
        source_id: impl Into<String>,
        notification_type: NotificationType,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            recipient_role: recipient.role,
            recipient_id: recipient.id.clone(),
            source_kind,
            source_id: source_id.into(),
            notification_type,
            priority,
            title: title.into(),
            message: message.into(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Utc::now());
        }
    }

    pub fn mark_unread(&mut self) {
        self.is_read = false;
        self.read_at = None;
    }
}

impl Entity for Notification {
    const KIND: EntityKind = EntityKind::Notification;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.recipient_id, self.recipient_role))
    }
}

impl StoredEntity for Notification {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.notifications.as_ref()
    }
}

impl Governed for Notification {
    fn target(&self) -> Target<'_> {
        Target::owned_by(&self.recipient_id)
    }
}
