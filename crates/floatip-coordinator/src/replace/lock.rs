//! Process-wide registry of droplets with a replace in flight

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe set of droplet ids currently being replaced
#[derive(Debug, Clone, Default)]
pub struct ReplaceLocks {
    inner: Arc<Mutex<HashSet<u64>>>,
}

impl ReplaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<u64>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `droplet_id`, or `None` if another replace holds it
    pub fn try_acquire(&self, droplet_id: u64) -> Option<ReplaceLease> {
        if !self.lock().insert(droplet_id) {
            return None;
        }
        Some(ReplaceLease {
            locks: self.clone(),
            droplet_id,
        })
    }

    pub fn is_held(&self, droplet_id: u64) -> bool {
        self.lock().contains(&droplet_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Claim on one droplet, released on drop
#[derive(Debug)]
pub struct ReplaceLease {
    locks: ReplaceLocks,
    droplet_id: u64,
}

impl Drop for ReplaceLease {
    fn drop(&mut self) {
        self.locks.lock().remove(&self.droplet_id);
    }
}
