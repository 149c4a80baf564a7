use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-entity-key async locks, so at most one task per `(repo, number)` runs
/// at a time while unrelated entities proceed in parallel (Design Note 9.1).
///
/// The table itself never evicts entries — one idle `tokio::sync::Mutex` per
/// entity ever seen is the accepted cost (Design Note 9.1: "the cost is a
/// lock per entity that has ever been seen, never reclaimed").
#[derive(Default)]
pub struct KeyedMutexTable {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedMutexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, creating its slot if this is the first
    /// time `key` has been seen. The table's own mutex is held only long
    /// enough to look up or insert the `Arc`; the per-key lock is then
    /// acquired outside the table lock.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut table = self.locks.lock().expect("keyed mutex table poisoned");
            table.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}
