//! Publish / Close Assignment Use Cases

use std::sync::Arc;
use tracing::info;

use crate::assignment::entity::Assignment;
use crate::lifecycle::{apply_transition, AssignmentLifecycle, AssignmentStatus, Lifecycle, TransitionPayload};
use crate::shared::authorization_service::{Action, AuthorizationGate};
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore};
use crate::usecase::{ExecutionContext, StoredAggregate, UnitOfWork, WorkflowEvent};

pub struct PublishAssignmentUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl PublishAssignmentUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            store,
            gate,
            unit_of_work,
        }
    }

    /// Publish the assignment and create one academic task per cohort
    /// student, all in one commit.
    pub fn execute(&self, assignment_id: &str, ctx: ExecutionContext) -> Result<Assignment> {
        self.store
            .locks
            .with_lock(EntityKind::Assignment, assignment_id, || self.publish(assignment_id, &ctx))
    }

    fn publish(&self, assignment_id: &str, ctx: &ExecutionContext) -> Result<Assignment> {
        let assignment = self.store.assignments.require(assignment_id)?;
        self.gate
            .require_on(&ctx.actor, Action::PublishAssignment, &assignment)?;

        let published = apply_transition::<AssignmentLifecycle>(
            &assignment,
            AssignmentStatus::Published,
            ctx.actor.role,
            &TransitionPayload::none(),
        )?;
        let tasks = published.fan_out();

        let mut events = Vec::with_capacity(tasks.len() + 1);
        events.push(WorkflowEvent::transitioned(
            ctx,
            &published,
            AssignmentLifecycle::FIELD,
            assignment.status,
            published.status,
        ));
        events.extend(tasks.iter().map(|task| WorkflowEvent::created(ctx, task)));

        let mut aggregates: Vec<&dyn StoredAggregate> = Vec::with_capacity(tasks.len() + 1);
        aggregates.push(&published);
        aggregates.extend(tasks.iter().map(|t| t as &dyn StoredAggregate));

        self.unit_of_work.commit_all(&aggregates, events)?;

        info!(
            assignment_id = %published.id,
            tasks = tasks.len(),
            "Assignment published"
        );
        Ok(published)
    }

    pub fn close(&self, assignment_id: &str, ctx: ExecutionContext) -> Result<Assignment> {
        self.store
            .locks
            .with_lock(EntityKind::Assignment, assignment_id, || self.close_locked(assignment_id, &ctx))
    }

    fn close_locked(&self, assignment_id: &str, ctx: &ExecutionContext) -> Result<Assignment> {
        let assignment = self.store.assignments.require(assignment_id)?;
        self.gate
            .require_on(&ctx.actor, Action::CloseAssignment, &assignment)?;

        let closed = apply_transition::<AssignmentLifecycle>(
            &assignment,
            AssignmentStatus::Closed,
            ctx.actor.role,
            &TransitionPayload::none(),
        )?;

        let event = WorkflowEvent::transitioned(
            ctx,
            &closed,
            AssignmentLifecycle::FIELD,
            assignment.status,
            closed.status,
        );
        self.unit_of_work.commit(&closed, event)?;

        info!(assignment_id = %closed.id, "Assignment closed");
        Ok(closed)
    }
}
