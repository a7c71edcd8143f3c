//! Use Case Infrastructure
//!
//! - `DomainEvent` / `WorkflowEvent` - what happened, with tracing metadata
//! - `ExecutionContext` - the caller and tracing IDs for one execution
//! - `UnitOfWork` - commit of entity + event, then notification emission

pub mod domain_event;
pub mod execution_context;
pub mod unit_of_work;

pub use domain_event::{Audience, Change, DomainEvent, EventMetadata, Recipient, WorkflowEvent};
pub use execution_context::ExecutionContext;
pub use unit_of_work::{InMemoryUnitOfWork, StoredAggregate, UnitOfWork};
