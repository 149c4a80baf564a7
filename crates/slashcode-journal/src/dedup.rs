use std::collections::HashMap;
use std::sync::Mutex;

use slashcode_core::current_unix_timestamp_ms;

const DEFAULT_DEDUP_TTL_MS: u64 = 60 * 60 * 1_000;

/// Mapping from comment id to an expiry timestamp, with passive (on-access)
/// TTL expiry — no background sweeper required (Design Note 9: "the cost is
/// that old ids linger until next touch of their slot").
pub struct DedupTable {
    ttl_ms: u64,
    entries: Mutex<HashMap<u64, u64>>,
}

impl DedupTable {
    /// `ttl_ms <= 0` (via `None`/non-positive) normalizes to one hour.
    pub fn new(ttl_ms: i64) -> Self {
        let ttl_ms = if ttl_ms > 0 {
            ttl_ms as u64
        } else {
            DEFAULT_DEDUP_TTL_MS
        };
        Self {
            ttl_ms,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` the first time `id` is seen, or again after its entry
    /// has expired; returns `false` while an unexpired entry exists. Purges
    /// expired entries for `id` opportunistically on every call.
    pub fn mark_if_new(&self, id: u64) -> bool {
        let now = current_unix_timestamp_ms();
        let mut guard = self.entries.lock().expect("dedup mutex poisoned");
        match guard.get(&id) {
            Some(expires_at) if *expires_at > now => false,
            _ => {
                guard.insert(id, now + self.ttl_ms);
                true
            }
        }
    }
}

impl Default for DedupTable {
    fn default() -> Self {
        Self::new(0)
    }
}
