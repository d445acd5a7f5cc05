//! Exponential backoff with jitter, capped by the caller's remaining budget.

use std::time::Duration;
use rand::Rng;

/// Delay before retry number `attempt` (1-based), never longer than `cap`.
pub fn calculate_backoff(attempt: u32, base: Duration, cap: Duration) -> Duration {
    if attempt == 0 || base.is_zero() {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    let delay = base.saturating_mul(factor);

    // Up to 10% jitter on top of the exponential step
    let jitter_range_ms = (delay.as_millis() / 10) as u64;
    let jitter = if jitter_range_ms > 0 {
        Duration::from_millis(rand::thread_rng().gen_range(0..jitter_range_ms))
    } else {
        Duration::ZERO
    };

    (delay + jitter).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(100);
        let cap = Duration::from_secs(2);

        let b1 = calculate_backoff(1, base, cap);
        assert!(b1 >= Duration::from_millis(100) && b1 < Duration::from_millis(110));

        let b2 = calculate_backoff(2, base, cap);
        assert!(b2 >= Duration::from_millis(200));

        assert_eq!(calculate_backoff(10, base, Duration::from_secs(1)), Duration::from_secs(1));
        assert_eq!(calculate_backoff(0, base, cap), Duration::ZERO);
    }
}
