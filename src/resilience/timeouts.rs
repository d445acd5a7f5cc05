//! Deadline enforcement.
//!
//! # Responsibilities
//! - Carry one absolute deadline through the whole lookup (retries included)
//! - Cancel the in-flight future when the deadline passes
//!
//! # Design Decisions
//! - The deadline is an explicit value, never ambient state
//! - Cancellation is by drop: the lookup future is discarded, its result lost
//! - Timeout errors are distinct from transport errors and never retried

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Absolute point in time by which a call must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// The deadline passed before the guarded future finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// Run `fut` until it completes or `deadline` passes, whichever is first.
pub async fn with_deadline<F>(deadline: Deadline, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout_at(deadline.at, fut)
        .await
        .map_err(|_| DeadlineExceeded)
}
