//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod api_common;
pub mod error;
pub mod middleware;
pub mod tsid;

// APIs
pub mod health_api;
pub mod platform_config_api;

// Services
pub mod authorization_service;

// Re-export commonly used items
pub use api_common::{PaginatedResponse, PaginationParams};
pub use authorization_service::{Action, AuthorizationGate, Decision, DenyReason, Governed, Target};
pub use error::{PlatformError, Result};
pub use health_api::{health_router, HealthState};
pub use middleware::{AppState, Authenticated};
pub use platform_config_api::platform_config_router;
pub use tsid::TsidGenerator;
