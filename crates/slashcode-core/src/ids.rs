use std::sync::atomic::{AtomicU64, Ordering};

use crate::time_utils::current_unix_timestamp_ms;

const TASK_ID_PREFIX: &str = "task";

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a fresh, process-unique, opaque task id.
///
/// Composed of the current unix-millis timestamp and a monotonic in-process
/// counter rather than a random UUID, so the id space stays predictable for
/// tests and no external randomness dependency is pulled in.
pub fn next_task_id() -> String {
    let now = current_unix_timestamp_ms();
    let suffix = TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{TASK_ID_PREFIX}-{now}-{suffix:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_next_task_id_is_unique_across_calls() {
        let a = next_task_id();
        let b = next_task_id();
        assert_ne!(a, b);
        assert!(a.starts_with("task-"));
        assert!(b.starts_with("task-"));
    }
}
