// file: src/sync/registry.rs
// description: process-wide single-flight registry keyed by repository id
// reference: RAII permit release on scope exit

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks which repository ids currently have a sync run in flight.
///
/// At most one permit per id exists at any time within one process. The
/// registry is never persisted; a restart clears it.
#[derive(Debug, Clone, Default)]
pub struct SyncRegistry {
    active: Arc<Mutex<HashSet<i64>>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `id`. Returns `None` when a run for that id is
    /// already in flight. The permit releases the id when dropped, on every
    /// exit path including panics.
    pub fn try_acquire(&self, id: i64) -> Option<SyncPermit> {
        let mut active = lock_active(&self.active);
        if !active.insert(id) {
            return None;
        }

        Some(SyncPermit {
            active: Arc::clone(&self.active),
            id,
        })
    }

    pub fn is_active(&self, id: i64) -> bool {
        lock_active(&self.active).contains(&id)
    }

    pub fn active_count(&self) -> usize {
        lock_active(&self.active).len()
    }
}

/// Holding a permit means the id's run is the only one in flight.
#[derive(Debug)]
pub struct SyncPermit {
    active: Arc<Mutex<HashSet<i64>>>,
    id: i64,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        lock_active(&self.active).remove(&self.id);
    }
}

// A poisoned lock still holds a consistent id set; the panic that poisoned
// it is reported elsewhere.
fn lock_active(active: &Mutex<HashSet<i64>>) -> std::sync::MutexGuard<'_, HashSet<i64>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}
