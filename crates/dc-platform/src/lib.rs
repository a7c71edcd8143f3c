//! DentalCampus Platform
//!
//! Workflow engine for a dental-school teaching clinic:
//! - Appointment booking with slot conflict detection
//! - Teaching schedules with seat-limited enrollment
//! - Approval requests, clinical cases, assignments, tasks and evaluations
//! - Role-scoped authorization over every action
//! - Notifications derived from committed workflow events
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Queries over the entity store
//! - `operations` - Use case operations
//! - `api` - REST endpoints

// Workflow aggregates
pub mod appointment;
pub mod schedule;
pub mod approval;
pub mod clinical_case;
pub mod assignment;
pub mod academic_task;
pub mod evaluation;
pub mod notification;

// Engine
pub mod booking;
pub mod directory;
pub mod lifecycle;
pub mod platform;
pub mod scheduling;
pub mod store;

// Shared infrastructure
pub mod shared;

// Cross-cutting concerns
pub mod usecase;
pub mod seed;

use axum::Router;
use utoipa::OpenApi;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;
pub use shared::authorization_service::{Action, AuthorizationGate, DenyReason};
pub use shared::middleware::{AppState, Authenticated};

// Re-export use case infrastructure
pub use usecase::{DomainEvent, ExecutionContext, InMemoryUnitOfWork, UnitOfWork, WorkflowEvent};

// Re-export main entity types for convenience
pub use academic_task::entity::AcademicTask;
pub use appointment::entity::Appointment;
pub use approval::entity::ApprovalRequest;
pub use assignment::entity::Assignment;
pub use clinical_case::entity::ClinicalCase;
pub use evaluation::entity::{Criterion, Evaluation};
pub use notification::entity::{Notification, NotificationType, Priority};
pub use schedule::entity::{DayOfWeek, Schedule, ScheduleType};

pub use booking::{BookingFlow, BookingStep};
pub use directory::{InMemoryDirectory, Practitioner, PractitionerDirectory};
pub use lifecycle::{
    AppointmentStatus, ApprovalStatus, AssignmentStatus, CaseApprovalStatus, CaseStatus, EvaluationStatus,
    ScheduleStatus, TaskStatus,
};
pub use platform::ClinicPlatform;
pub use scheduling::{BookingPolicy, CapacityScheduler, ReservationToken, TimeSlot};
pub use store::{EntityKind, EntityStore, EventLog};

/// OpenAPI document for every REST surface
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DentalCampus Platform API",
        description = "Appointments, schedules, clinical workflow and notifications for a dental teaching clinic"
    ),
    paths(
        shared::health_api::get_health,
        shared::health_api::get_liveness,
        shared::health_api::get_readiness,
    ),
    nest(
        (path = "/api/appointments", api = appointment::api::AppointmentsApi),
        (path = "/api/bookings", api = booking::api::BookingsApi),
        (path = "/api/schedules", api = schedule::api::SchedulesApi),
        (path = "/api/approvals", api = approval::api::ApprovalsApi),
        (path = "/api/cases", api = clinical_case::api::CasesApi),
        (path = "/api/assignments", api = assignment::api::AssignmentsApi),
        (path = "/api/tasks", api = academic_task::api::TasksApi),
        (path = "/api/evaluations", api = evaluation::api::EvaluationsApi),
        (path = "/api/notifications", api = notification::api::NotificationsApi),
        (path = "/api/config", api = shared::platform_config_api::PlatformConfigApi),
    ),
    components(schemas(shared::error::ErrorResponse, shared::api_common::SuccessResponse)),
    tags(
        (name = "appointments", description = "Direct booking and appointment lifecycle"),
        (name = "bookings", description = "Guided four-step booking flow"),
        (name = "schedules", description = "Teaching schedules and enrollment"),
        (name = "approvals", description = "Treatment approval requests"),
        (name = "cases", description = "Clinical cases"),
        (name = "assignments", description = "Assignments and their task fan-out"),
        (name = "tasks", description = "Academic tasks"),
        (name = "evaluations", description = "Weighted-criteria evaluations"),
        (name = "notifications", description = "Caller's notification inbox"),
        (name = "config", description = "Platform configuration"),
        (name = "health", description = "Health probes"),
    )
)]
pub struct ApiDoc;

/// Every REST route of the platform, without transport layers.
pub fn api_router(state: AppState, health: shared::HealthState) -> Router {
    Router::new()
        .nest("/api/appointments", appointment::appointments_router(state.clone()))
        .nest("/api/bookings", booking::api::bookings_router(state.clone()))
        .nest("/api/schedules", schedule::schedules_router(state.clone()))
        .nest("/api/approvals", approval::approvals_router(state.clone()))
        .nest("/api/cases", clinical_case::cases_router(state.clone()))
        .nest("/api/assignments", assignment::assignments_router(state.clone()))
        .nest("/api/tasks", academic_task::tasks_router(state.clone()))
        .nest("/api/evaluations", evaluation::evaluations_router(state.clone()))
        .nest("/api/notifications", notification::notifications_router(state.clone()))
        .nest("/api/config", shared::platform_config_router(state))
        .merge(shared::health_router(health))
}
