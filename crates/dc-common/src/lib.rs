use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

pub mod logging;

// ============================================================================
// Caller Identity
// ============================================================================

/// Portal role of a caller.
///
/// Authentication happens outside the platform; by the time a request reaches
/// the workflow engine the caller has been reduced to an id and one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Student,
    Professor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Patient, Role::Student, Role::Professor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Admin => "admin",
        }
    }

    /// Students and professors can be booked for appointments.
    pub fn is_practitioner(&self) -> bool {
        matches!(self, Role::Student | Role::Professor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "student" => Ok(Role::Student),
            "professor" => Ok(Role::Professor),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The principal invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn patient(id: impl Into<String>) -> Self {
        Self::new(id, Role::Patient)
    }

    pub fn student(id: impl Into<String>) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn professor(id: impl Into<String>) -> Self {
        Self::new(id, Role::Professor)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}
