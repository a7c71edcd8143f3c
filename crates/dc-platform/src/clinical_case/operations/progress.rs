//! Record Case Progress Use Case

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::clinical_case::entity::ClinicalCase;
use crate::lifecycle::CaseStatus;
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCaseProgressCommand {
    pub case_id: String,

    #[serde(default)]
    pub sessions_completed: Option<u32>,

    /// Explicit percentage; derived from sessions when absent
    #[serde(default)]
    pub progress: Option<u8>,
}

pub struct RecordCaseProgressUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl RecordCaseProgressUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    pub fn execute(&self, command: RecordCaseProgressCommand, ctx: ExecutionContext) -> Result<ClinicalCase> {
        self.store
            .locks
            .with_lock(EntityKind::ClinicalCase, &command.case_id, || self.record(&command, &ctx))
    }

    fn record(&self, command: &RecordCaseProgressCommand, ctx: &ExecutionContext) -> Result<ClinicalCase> {
        let case = self.store.cases.require(&command.case_id)?;
        self.gate.require_on(&ctx.actor, Action::RecordCaseProgress, &case)?;

        if case.status != CaseStatus::Active {
            return Err(PlatformError::validation(
                "CASE_NOT_ACTIVE",
                format!("progress can only be recorded on an active case, this one is {}", case.status),
            ));
        }

        let mut updated = case.clone();
        let mut changed: Vec<&str> = Vec::new();

        if let Some(sessions) = command.sessions_completed {
            if sessions > updated.total_sessions {
                return Err(PlatformError::validation(
                    "INVALID_SESSIONS",
                    format!("{} sessions exceeds the planned {}", sessions, updated.total_sessions),
                ));
            }
            if sessions != updated.sessions_completed {
                updated.sessions_completed = sessions;
                changed.push("sessionsCompleted");
            }
        }

        let progress = match command.progress {
            Some(p) if p > 100 => {
                return Err(PlatformError::validation(
                    "INVALID_PROGRESS",
                    "progress must be between 0 and 100",
                ))
            }
            Some(p) => p,
            None if command.sessions_completed.is_some() => session_share(&updated),
            None => updated.progress,
        };
        if progress != updated.progress {
            updated.progress = progress;
            changed.push("progress");
        }

        if changed.is_empty() {
            return Ok(case);
        }

        updated.updated_at = Utc::now();
        let event = WorkflowEvent::updated(ctx, &updated, &changed);
        self.unit_of_work.commit(&updated, event)?;

        info!(
            case_id = %updated.id,
            progress = updated.progress,
            sessions = updated.sessions_completed,
            "Case progress recorded"
        );
        Ok(updated)
    }
}

/// Percentage of planned sessions done, rounded down.
fn session_share(case: &ClinicalCase) -> u8 {
    if case.total_sessions == 0 {
        return 0;
    }
    let pct = u64::from(case.sessions_completed) * 100 / u64::from(case.total_sessions);
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_share_rounds_down() {
        let mut case = ClinicalCase::new("pat-1", "stu-1", "prof-1", "Root canal", "Endodontics", 3);
        assert_eq!(session_share(&case), 0);
        case.sessions_completed = 1;
        assert_eq!(session_share(&case), 33);
        case.sessions_completed = 3;
        assert_eq!(session_share(&case), 100);
    }
}
