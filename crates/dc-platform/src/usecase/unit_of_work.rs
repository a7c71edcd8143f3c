//! Unit of Work
//!
//! Commits entity changes together with their workflow events, then hands
//! the events to the notification emitter.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::domain_event::{DomainEvent, WorkflowEvent};
use crate::notification::emitter::NotificationEmitter;
use crate::shared::error::Result;
use crate::store::{EntityKind, EntityStore, EventLog, StoredEntity};

/// Commit boundary for every state change.
///
/// Use cases validate and compute the new state on a copy, then call one of
/// these methods. Either every write of the call lands or none does.
///
/// ```ignore
/// let mut request = approvals.require(&command.request_id)?;
/// let from = request.status;
/// request = apply_transition::<ApprovalLifecycle>(&request, target, role, &payload)?;
/// let event = WorkflowEvent::transitioned(&ctx, &request, "status", from, target);
/// self.unit_of_work.commit(&request, event)?;
/// ```
pub trait UnitOfWork: Send + Sync {
    /// Persist (insert or replace) the aggregate and record its event.
    fn commit(&self, aggregate: &dyn StoredAggregate, event: WorkflowEvent) -> Result<WorkflowEvent>;

    /// Remove the aggregate and record its event.
    fn commit_delete(&self, aggregate: &dyn StoredAggregate, event: WorkflowEvent) -> Result<WorkflowEvent>;

    /// Persist several aggregates with their events, e.g. an assignment and
    /// the tasks publishing fans out.
    fn commit_all(
        &self,
        aggregates: &[&dyn StoredAggregate],
        events: Vec<WorkflowEvent>,
    ) -> Result<Vec<WorkflowEvent>>;
}

/// Object-safe view of a [`StoredEntity`].
pub trait StoredAggregate: Send + Sync {
    fn aggregate_id(&self) -> &str;
    fn aggregate_kind(&self) -> EntityKind;
    fn save_into(&self, store: &EntityStore) -> Result<()>;
    fn delete_from(&self, store: &EntityStore) -> Result<()>;
}

impl<T: StoredEntity> StoredAggregate for T {
    fn aggregate_id(&self) -> &str {
        self.id()
    }

    fn aggregate_kind(&self) -> EntityKind {
        T::KIND
    }

    fn save_into(&self, store: &EntityStore) -> Result<()> {
        store.repository::<T>().save(self)
    }

    fn delete_from(&self, store: &EntityStore) -> Result<()> {
        store.repository::<T>().delete(self.id())?;
        Ok(())
    }
}

/// Unit of work over the in-memory [`EntityStore`].
pub struct InMemoryUnitOfWork {
    store: Arc<EntityStore>,
    events: Arc<EventLog>,
    emitter: Option<Arc<NotificationEmitter>>,
    commit_lock: Mutex<()>,
}

impl InMemoryUnitOfWork {
    pub fn new(store: Arc<EntityStore>, events: Arc<EventLog>) -> Self {
        Self {
            store,
            events,
            emitter: None,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<NotificationEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Notification failures are logged and never undo the commit.
    fn emit(&self, event: &WorkflowEvent) {
        let Some(emitter) = &self.emitter else {
            return;
        };

        if let Err(e) = emitter.emit(event) {
            warn!(
                event_id = event.event_id(),
                event_type = event.event_type(),
                error = %e,
                "Failed to emit notifications"
            );
        }
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn commit(&self, aggregate: &dyn StoredAggregate, event: WorkflowEvent) -> Result<WorkflowEvent> {
        {
            let _guard = self.commit_lock.lock();
            aggregate.save_into(&self.store)?;
            self.events.append(event.clone());
        }

        debug!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            entity_id = aggregate.aggregate_id(),
            "Committed"
        );

        self.emit(&event);
        Ok(event)
    }

    fn commit_delete(&self, aggregate: &dyn StoredAggregate, event: WorkflowEvent) -> Result<WorkflowEvent> {
        {
            let _guard = self.commit_lock.lock();
            aggregate.delete_from(&self.store)?;
            self.events.append(event.clone());
        }

        debug!(
            event_id = event.event_id(),
            kind = %aggregate.aggregate_kind(),
            entity_id = aggregate.aggregate_id(),
            "Committed delete"
        );

        self.emit(&event);
        Ok(event)
    }

    fn commit_all(
        &self,
        aggregates: &[&dyn StoredAggregate],
        events: Vec<WorkflowEvent>,
    ) -> Result<Vec<WorkflowEvent>> {
        {
            let _guard = self.commit_lock.lock();
            for aggregate in aggregates {
                aggregate.save_into(&self.store)?;
            }
            for event in &events {
                self.events.append(event.clone());
            }
        }

        debug!(
            aggregates = aggregates.len(),
            events = events.len(),
            "Committed batch"
        );

        for event in &events {
            self.emit(event);
        }
        Ok(events)
    }
}
