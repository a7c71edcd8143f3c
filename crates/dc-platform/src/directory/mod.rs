//! Practitioner Directory
//!
//! Read-only catalog of who can be booked for which specialty. The catalog
//! itself lives outside the platform; the in-memory directory is what the
//! server and the tests load it into.

use dc_common::Role;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: String,
    pub name: String,
    /// Student or professor
    pub role: Role,
    pub specialties: Vec<String>,
}

impl Practitioner {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            specialties: Vec::new(),
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.push(specialty.into());
        self
    }

    pub fn serves(&self, specialty: &str) -> bool {
        self.specialties.iter().any(|s| s.eq_ignore_ascii_case(specialty))
    }
}

pub trait PractitionerDirectory: Send + Sync {
    fn find(&self, practitioner_id: &str) -> Option<Practitioner>;

    /// Practitioners serving `specialty`, in registration order.
    fn serving(&self, specialty: &str) -> Vec<Practitioner>;

    /// Every specialty offered by at least one practitioner.
    fn specialties(&self) -> Vec<String>;

    /// The practitioner, provided they serve `specialty`.
    fn require_serving(&self, practitioner_id: &str, specialty: &str) -> Result<Practitioner> {
        let practitioner = self
            .find(practitioner_id)
            .ok_or_else(|| PlatformError::not_found("Practitioner", practitioner_id))?;

        if !practitioner.serves(specialty) {
            return Err(PlatformError::validation(
                "SPECIALTY_NOT_SERVED",
                format!("{} does not practice {}", practitioner.name, specialty),
            ));
        }
        Ok(practitioner)
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    practitioners: RwLock<IndexMap<String, Practitioner>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a practitioner. Only students and professors are bookable.
    pub fn register(&self, practitioner: Practitioner) -> Result<()> {
        if !practitioner.role.is_practitioner() {
            return Err(PlatformError::validation(
                "NOT_A_PRACTITIONER",
                format!("{} cannot be booked for appointments", practitioner.role),
            ));
        }
        self.practitioners
            .write()
            .insert(practitioner.id.clone(), practitioner);
        Ok(())
    }
}

impl PractitionerDirectory for InMemoryDirectory {
    fn find(&self, practitioner_id: &str) -> Option<Practitioner> {
        self.practitioners.read().get(practitioner_id).cloned()
    }

    fn serving(&self, specialty: &str) -> Vec<Practitioner> {
        self.practitioners
            .read()
            .values()
            .filter(|p| p.serves(specialty))
            .cloned()
            .collect()
    }

    fn specialties(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for practitioner in self.practitioners.read().values() {
            for specialty in &practitioner.specialties {
                if !all.iter().any(|s| s.eq_ignore_ascii_case(specialty)) {
                    all.push(specialty.clone());
                }
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.register(
            Practitioner::new("stu-1", "Ana Ruiz", Role::Student)
                .with_specialty("Orthodontics")
                .with_specialty("Endodontics"),
        )
        .unwrap();
        dir.register(Practitioner::new("prof-1", "Dr. Lee", Role::Professor).with_specialty("Orthodontics"))
            .unwrap();
        dir
    }

    #[test]
    fn test_serving_filters_by_specialty() {
        let dir = directory();
        let ids: Vec<String> = dir.serving("orthodontics").into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["stu-1", "prof-1"]);
        assert_eq!(dir.serving("Endodontics").len(), 1);
    }

    #[test]
    fn test_specialties_are_unique() {
        assert_eq!(directory().specialties(), vec!["Orthodontics", "Endodontics"]);
    }

    #[test]
    fn test_require_serving() {
        let dir = directory();
        assert!(dir.require_serving("prof-1", "Orthodontics").is_ok());
        assert_eq!(
            dir.require_serving("prof-1", "Endodontics").unwrap_err().code(),
            "SPECIALTY_NOT_SERVED"
        );
        assert_eq!(dir.require_serving("ghost", "Endodontics").unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_patients_cannot_be_registered() {
        let dir = InMemoryDirectory::new();
        assert!(dir.register(Practitioner::new("pat-1", "Sam", Role::Patient)).is_err());
    }
}
