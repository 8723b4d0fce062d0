//! Retry delays.
//!
//! Join and host detection poll at a fixed interval. Control location backs
//! off exponentially. The two must not be mixed.

use std::cmp;

use crate::config::RecorderConfig;
use crate::scheduler::Millis;

/// Delay before re-entering the cascade after the `attempt`-th failure (1-based).
pub fn activation_delay(config: &RecorderConfig, attempt: u32) -> Millis {
    let exponent = attempt.saturating_sub(1).min(63);
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let delay = config.activation.backoff_base_ms.saturating_mul(factor);
    cmp::min(delay, config.activation.backoff_cap_ms)
}

pub fn poll_delay(config: &RecorderConfig) -> Millis {
    config.detection.poll_interval_ms
}

/// Delays for `failures` consecutive activation failures.
pub fn delay_schedule(config: &RecorderConfig, failures: u32) -> Vec<Millis> {
    (1..=failures).map(|attempt| activation_delay(config, attempt)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_failures_double_then_cap() {
        let config = RecorderConfig::default();
        assert_eq!(
            delay_schedule(&config, 6),
            vec![2_000, 4_000, 8_000, 16_000, 30_000, 30_000]
        );
    }

    #[test]
    fn huge_attempts_saturate_at_cap() {
        let config = RecorderConfig::default();
        assert_eq!(activation_delay(&config, 200), 30_000);
    }

    #[test]
    fn polling_is_flat() {
        let config = RecorderConfig::default();
        assert_eq!(poll_delay(&config), 2_000);
    }
}
