use std::time::Duration;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(15);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Tunables for a [`crate::Dispatcher`], normalized the way `spec.md` §4.3's
/// table requires: non-positive or out-of-range values fall back to the
/// documented default rather than erroring, so a misconfigured deployment
/// degrades to sane behavior instead of refusing to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub queue_size: usize,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_size: 0,
            max_attempts: 0,
            initial_backoff: Duration::ZERO,
            backoff_multiplier: 0.0,
            max_backoff: Duration::ZERO,
        }
        .normalized()
    }
}

impl DispatcherConfig {
    /// Applies the defaulting rules. `QueueSize`'s default depends on the
    /// (already-normalized) worker count, so workers is normalized first.
    pub fn normalized(&self) -> Self {
        let workers = if self.workers == 0 { DEFAULT_WORKERS } else { self.workers };
        let queue_size = if self.queue_size == 0 { 4 * workers } else { self.queue_size };
        let max_attempts = if self.max_attempts == 0 { DEFAULT_MAX_ATTEMPTS } else { self.max_attempts };
        let initial_backoff = if self.initial_backoff.is_zero() { DEFAULT_INITIAL_BACKOFF } else { self.initial_backoff };
        let backoff_multiplier = if self.backoff_multiplier <= 1.0 { DEFAULT_BACKOFF_MULTIPLIER } else { self.backoff_multiplier };
        let max_backoff = if self.max_backoff.is_zero() { DEFAULT_MAX_BACKOFF } else { self.max_backoff };
        Self {
            workers,
            queue_size,
            max_attempts,
            initial_backoff,
            backoff_multiplier,
            max_backoff,
        }
    }
}
