//! Domain Events
//!
//! Every committed change to a workflow entity produces one event. Events are
//! appended to the event log and handed to the notification emitter.
//!
//! # Event Type Format
//!
//! `dentalcampus:clinic:{entity}:{action}`, e.g.
//! `dentalcampus:clinic:approval-request:approved`.
//!
//! # Subject Format
//!
//! `clinic.{entity}.{id}`, e.g. `clinic.appointment.0HZXEQ5Y8JY5Z`

use chrono::{DateTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ExecutionContext;
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind};

/// Base trait for all domain events.
pub trait DomainEvent: Send + Sync {
    /// Unique identifier for this event (TSID).
    fn event_id(&self) -> &str;

    /// Event type code: `{app}:{domain}:{entity}:{action}`
    fn event_type(&self) -> &str;

    fn spec_version(&self) -> &str;

    fn source(&self) -> &str;

    /// Qualified entity identifier: `{domain}.{entity}.{id}`
    fn subject(&self) -> &str;

    fn time(&self) -> DateTime<Utc>;

    fn execution_id(&self) -> &str;

    fn correlation_id(&self) -> &str;

    fn causation_id(&self) -> Option<&str>;

    /// Principal who initiated the action that produced this event.
    fn principal_id(&self) -> &str;

    /// Events in the same group are ordered: `{domain}:{entity}:{id}`
    fn message_group(&self) -> &str;

    fn to_data_json(&self) -> String;
}

/// Common metadata for domain events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub spec_version: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub message_group: String,
}

impl EventMetadata {
    /// Create metadata copying the tracing fields from `ctx`.
    pub fn new(
        ctx: &ExecutionContext,
        event_type: impl Into<String>,
        spec_version: &str,
        source: &str,
        subject: String,
        message_group: String,
    ) -> Self {
        Self {
            event_id: TsidGenerator::generate(),
            event_type: event_type.into(),
            spec_version: spec_version.to_string(),
            source: source.to_string(),
            subject,
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            causation_id: ctx.causation_id.clone(),
            principal_id: ctx.actor.id.clone(),
            message_group,
        }
    }
}

/// Implements [`DomainEvent`] by delegating to a field named `metadata`.
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn spec_version(&self) -> &str {
                &self.metadata.spec_version
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn causation_id(&self) -> Option<&str> {
                self.metadata.causation_id.as_deref()
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn message_group(&self) -> &str {
                &self.metadata.message_group
            }

            fn to_data_json(&self) -> String {
                serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    };
}

// ============================================================================
// Workflow events
// ============================================================================

/// Someone who may hear about a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    pub role: Role,
}

impl Recipient {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

/// The people attached to an entity at the time of a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Recipient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cohort: Vec<Recipient>,
}

impl Audience {
    pub fn new(owner: Recipient) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn with_assignee(mut self, assignee: Recipient) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_participant(mut self, participant: Recipient) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn with_cohort(mut self, cohort: Vec<Recipient>) -> Self {
        self.cohort = cohort;
        self
    }
}

/// What happened to the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    Created,
    Transitioned {
        field: String,
        from: String,
        to: String,
    },
    Updated {
        fields: Vec<String>,
    },
    Deleted,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Created => f.write_str("created"),
            Change::Transitioned { field, from, to } => write!(f, "{field}: {from} -> {to}"),
            Change::Updated { fields } => write!(f, "updated {}", fields.join(", ")),
            Change::Deleted => f.write_str("deleted"),
        }
    }
}

/// Event produced by every workflow entity commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub change: Change,
    /// Human-readable description of the entity, used in notification text
    pub summary: String,
    pub audience: Audience,
}

impl_domain_event!(WorkflowEvent);

impl WorkflowEvent {
    const SPEC_VERSION: &'static str = "1.0";
    const SOURCE: &'static str = "dentalcampus:clinic";

    pub fn created<T: Entity>(ctx: &ExecutionContext, entity: &T) -> Self {
        Self::build(ctx, entity, "created", Change::Created)
    }

    /// A lifecycle move on `field` (`status`, `approvalStatus`).
    pub fn transitioned<T: Entity>(
        ctx: &ExecutionContext,
        entity: &T,
        field: &str,
        from: impl fmt::Display,
        to: impl fmt::Display,
    ) -> Self {
        let to = to.to_string();
        let action = if field == "status" {
            to.clone()
        } else {
            format!("{field}.{to}")
        };
        let change = Change::Transitioned {
            field: field.to_string(),
            from: from.to_string(),
            to,
        };
        Self::build(ctx, entity, &action, change)
    }

    pub fn updated<T: Entity>(ctx: &ExecutionContext, entity: &T, fields: &[&str]) -> Self {
        let change = Change::Updated {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        };
        Self::build(ctx, entity, "updated", change)
    }

    pub fn deleted<T: Entity>(ctx: &ExecutionContext, entity: &T) -> Self {
        Self::build(ctx, entity, "deleted", Change::Deleted)
    }

    fn build<T: Entity>(ctx: &ExecutionContext, entity: &T, action: &str, change: Change) -> Self {
        let kind = T::KIND;
        let id = entity.id();
        let metadata = EventMetadata::new(
            ctx,
            format!("dentalcampus:clinic:{}:{}", kind.as_str(), action),
            Self::SPEC_VERSION,
            Self::SOURCE,
            format!("clinic.{}.{}", kind.as_str(), id),
            format!("clinic:{}:{}", kind.as_str(), id),
        );

        Self {
            metadata,
            entity_kind: kind,
            entity_id: id.to_string(),
            change,
            summary: entity.summary(),
            audience: entity.audience(),
        }
    }

    /// Target status when this event is a transition on `field`.
    pub fn transitioned_to(&self, field: &str) -> Option<&str> {
        match &self.change {
            Change::Transitioned { field: f, to, .. } if f == field => Some(to),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_common::Actor;

    #[derive(Debug, Clone, Serialize)]
    struct ProbeEvent {
        metadata: EventMetadata,
        pub note: String,
    }

    impl_domain_event!(ProbeEvent);

    #[test]
    fn test_metadata_copies_context() {
        let ctx = ExecutionContext::with_correlation(Actor::professor("prof-1"), "corr-7");
        let event = ProbeEvent {
            metadata: EventMetadata::new(
                &ctx,
                "dentalcampus:clinic:probe:created",
                "1.0",
                "dentalcampus:clinic",
                "clinic.probe.1".to_string(),
                "clinic:probe:1".to_string(),
            ),
            note: "hello".to_string(),
        };

        assert_eq!(event.event_type(), "dentalcampus:clinic:probe:created");
        assert_eq!(event.correlation_id(), "corr-7");
        assert_eq!(event.execution_id(), ctx.execution_id);
        assert_eq!(event.principal_id(), "prof-1");
        assert!(event.causation_id().is_none());
        assert!(event.to_data_json().contains("\"note\":\"hello\""));
    }

    #[test]
    fn test_change_display() {
        let change = Change::Transitioned {
            field: "status".into(),
            from: "pending".into(),
            to: "approved".into(),
        };
        assert_eq!(change.to_string(), "status: pending -> approved");
    }
}
