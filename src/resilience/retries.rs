//! Retry decisions for inventory lookups.
//!
//! # Design Decisions
//! - Only transient transport failures retry (connect/reset, 502/503/504)
//! - Timeouts and well-formed answers never retry
//! - A retry is skipped when its backoff would not fit before the deadline

use std::time::Duration;

use crate::config::ValidationPolicy;
use crate::inventory::LookupError;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::timeouts::Deadline;

/// Retry budget for one validation call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPlan {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPlan {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_policy(policy: &ValidationPolicy) -> Self {
        Self::new(policy.max_retries, Duration::from_millis(policy.retry_backoff_ms))
    }

    /// Delay before the next attempt, or `None` to stop.
    ///
    /// `attempts` is the number of attempts already made.
    pub fn next_delay(
        &self,
        attempts: u32,
        error: &LookupError,
        deadline: &Deadline,
    ) -> Option<Duration> {
        if !error.is_transient() || attempts > self.max_retries {
            return None;
        }

        let remaining = deadline.remaining();
        let delay = calculate_backoff(attempts, self.base_delay, remaining);
        if delay >= remaining {
            None
        } else {
            Some(delay)
        }
    }
}
