//! Repository interface and the in-memory implementation

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Entity;
use crate::shared::error::{PlatformError, Result};

/// Storage for one entity type.
///
/// Implementations are internally synchronized; every call is a single
/// atomic read or write.
pub trait Repository<T: Entity>: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// All records in insertion order.
    fn find_all(&self) -> Result<Vec<T>>;

    fn find_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>>;

    /// Insert or replace the record with the entity's id.
    fn save(&self, entity: &T) -> Result<()>;

    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> Result<bool>;

    fn count(&self) -> Result<usize>;

    /// [`find_by_id`](Self::find_by_id), with a missing record as `NotFound`.
    fn require(&self, id: &str) -> Result<T> {
        self.find_by_id(id)?
            .ok_or_else(|| PlatformError::not_found(T::KIND.label(), id))
    }

    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

/// Insertion-ordered in-memory repository.
pub struct InMemoryRepository<T> {
    records: RwLock<IndexMap<String, T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn find_all(&self) -> Result<Vec<T>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn find_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    fn save(&self, entity: &T) -> Result<()> {
        self.records
            .write()
            .insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().shift_remove(id).is_some())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }
}
