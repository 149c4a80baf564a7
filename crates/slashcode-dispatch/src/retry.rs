use std::time::Duration;

use crate::config::DispatcherConfig;

/// Backoff delay before attempt `next_attempt` (the attempt about to be
/// retried; the first retry has `next_attempt == 2`), per `spec.md` §4.3:
/// `min(InitialBackoff * BackoffMultiplier^(k-2), MaxBackoff)`.
pub fn backoff_delay(config: &DispatcherConfig, next_attempt: u32) -> Duration {
    let exponent = next_attempt.saturating_sub(2);
    let factor = config.backoff_multiplier.powi(exponent as i32);
    let millis = (config.initial_backoff.as_millis() as f64) * factor;
    let delay = Duration::from_millis(millis.round() as u64);
    delay.min(config.max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            workers: 1,
            queue_size: 1,
            max_attempts: 5,
            initial_backoff: Duration::from_secs(15),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(300),
        }
    }

    #[test]
    fn unit_first_retry_uses_initial_backoff_unscaled() {
        assert_eq!(backoff_delay(&config(), 2), Duration::from_secs(15));
    }

    #[test]
    fn functional_delay_doubles_with_each_subsequent_attempt() {
        let cfg = config();
        assert_eq!(backoff_delay(&cfg, 3), Duration::from_secs(30));
        assert_eq!(backoff_delay(&cfg, 4), Duration::from_secs(60));
    }

    #[test]
    fn regression_delay_is_capped_at_max_backoff() {
        let cfg = config();
        assert_eq!(backoff_delay(&cfg, 10), Duration::from_secs(300));
    }
}
