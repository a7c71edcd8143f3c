//! Execution Context
//!
//! Carries the caller and tracing IDs through one use case execution.

use chrono::{DateTime, Utc};
use dc_common::Actor;

use super::domain_event::DomainEvent;
use crate::shared::tsid::TsidGenerator;

/// Context for a use case execution.
///
/// The execution context enables:
/// - Request tracing via correlation_id
/// - Causal chain tracking via causation_id
/// - Audit trail via the acting principal
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for request tracing (usually from the X-Correlation-ID header)
    pub correlation_id: String,
    /// ID of the event that caused this execution (if any)
    pub causation_id: Option<String>,
    /// The caller performing the action
    pub actor: Actor,
    /// When the execution was initiated
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create a context for a fresh request. Correlation starts as the
    /// execution ID.
    pub fn create(actor: Actor) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            causation_id: None,
            actor,
            initiated_at: Utc::now(),
        }
    }

    /// Create a context with a correlation ID from an upstream system.
    pub fn with_correlation(actor: Actor, correlation_id: impl Into<String>) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: correlation_id.into(),
            causation_id: None,
            actor,
            initiated_at: Utc::now(),
        }
    }

    /// Create a context reacting to an earlier event, keeping its correlation.
    pub fn from_parent_event<E: DomainEvent>(parent: &E, actor: Actor) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: parent.correlation_id().to_string(),
            causation_id: Some(parent.event_id().to_string()),
            actor,
            initiated_at: Utc::now(),
        }
    }

    pub fn principal_id(&self) -> &str {
        &self.actor.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_uses_execution_id_as_correlation() {
        let ctx = ExecutionContext::create(Actor::student("stu-1"));
        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.execution_id, ctx.correlation_id);
        assert!(ctx.causation_id.is_none());
        assert_eq!(ctx.principal_id(), "stu-1");
    }

    #[test]
    fn test_with_correlation_keeps_upstream_id() {
        let ctx = ExecutionContext::with_correlation(Actor::admin("root"), "req-42");
        assert_eq!(ctx.correlation_id, "req-42");
        assert_ne!(ctx.execution_id, "req-42");
    }
}
