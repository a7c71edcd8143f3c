//! Append-only log of committed workflow events

use parking_lot::RwLock;

use super::EntityKind;
use crate::usecase::WorkflowEvent;

#[derive(Default)]
pub struct EventLog {
    events: RwLock<Vec<WorkflowEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: WorkflowEvent) {
        self.events.write().push(event);
    }

    pub fn all(&self) -> Vec<WorkflowEvent> {
        self.events.read().clone()
    }

    /// Events for one entity, oldest first.
    pub fn for_entity(&self, kind: EntityKind, id: &str) -> Vec<WorkflowEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.entity_kind == kind && e.entity_id == id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}
