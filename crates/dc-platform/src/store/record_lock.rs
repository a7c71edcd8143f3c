//! Per-record write locks
//!
//! Use cases that read a record, check a transition and write it back run
//! the whole sequence under the record's lock, so two callers acting on the
//! same record are applied one after the other.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use super::EntityKind;
use crate::shared::error::Result;

#[derive(Default)]
pub struct RecordLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the lock for `kind:{key}`.
    pub fn with_lock<R>(&self, kind: EntityKind, key: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let lock = self.lock_for(format!("{}:{}", kind.as_str(), key));
        let _guard = lock.lock();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn test_same_record_runs_one_at_a_time() {
        let locks = Arc::new(RecordLocks::new());
        let inside = Arc::new(AtomicU32::new(0));
        let overlaps = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let overlaps = overlaps.clone();
                thread::spawn(move || {
                    locks.with_lock(EntityKind::ApprovalRequest, "req-1", || {
                        if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_error_releases_lock() {
        let locks = RecordLocks::new();
        let first: Result<()> = locks.with_lock(EntityKind::AcademicTask, "t-1", || {
            Err(crate::shared::error::PlatformError::validation("X", "boom"))
        });
        assert!(first.is_err());
        assert_eq!(locks.with_lock(EntityKind::AcademicTask, "t-1", || Ok(7)).unwrap(), 7);
    }
}
