//! Circuit breaker guarding the inventory authority.
//!
//! # States
//! - Closed: normal operation, lookups pass through
//! - Open: authority assumed down, lookups fail fast
//! - Half-Open: one probe lookup tests whether it recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures >= threshold within window (and volume >= floor)
//! Open → Half-Open: after break duration, on the next admission
//! Half-Open → Closed: probe succeeds (window cleared)
//! Half-Open → Open: probe fails (opened_at reset)
//! ```
//!
//! # Design Decisions
//! - One breaker per process, shared by every validation call
//! - The whole state triple sits behind one mutex; readers get snapshots
//! - Admission hands out an RAII permit so a dropped probe frees its slot

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::ValidationPolicy;
use crate::observability::TelemetryEmitter;

/// Upper bound on outcomes kept in the sliding window.
const MAX_WINDOW_ENTRIES: usize = 4096;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Consistent view of the breaker, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    /// Failures currently inside the sampling window.
    pub failure_count: u32,
    /// Outcomes currently inside the sampling window.
    pub request_count: u32,
    /// Timestamp of the oldest outcome in the window.
    pub window_start: Option<Instant>,
    pub opened_at: Option<Instant>,
    pub probe_in_flight: bool,
}

/// Result of asking the breaker for admission.
#[derive(Debug)]
pub enum Admission {
    /// Call may proceed; report its outcome through the permit.
    Admitted(BreakerPermit),
    /// Rejected fast; carries the state that caused it.
    Rejected(CircuitState),
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    at: Instant,
    failed: bool,
}

#[derive(Debug, Default)]
struct OutcomeWindow {
    entries: VecDeque<Outcome>,
}

impl OutcomeWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(front) = self.entries.front() {
            if now.saturating_duration_since(front.at) > window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    fn push(&mut self, outcome: Outcome) {
        if self.entries.len() >= MAX_WINDOW_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(outcome);
    }

    fn failures(&self) -> u32 {
        self.entries.iter().filter(|o| o.failed).count() as u32
    }

    fn volume(&self) -> u32 {
        self.entries.len() as u32
    }

    fn start(&self) -> Option<Instant> {
        self.entries.front().map(|o| o.at)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl BreakerInner {
    fn transition(&mut self, to: CircuitState, now: Instant) -> Transition {
        let from = self.state;
        self.state = to;
        match to {
            CircuitState::Open => {
                self.opened_at = Some(now);
                self.probe_in_flight = false;
            }
            CircuitState::HalfOpen => {}
            CircuitState::Closed => {
                self.opened_at = None;
                self.probe_in_flight = false;
                self.window.clear();
            }
        }
        Transition { from, to }
    }
}

/// Process-wide circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    telemetry: TelemetryEmitter,
}

impl CircuitBreaker {
    /// Create a closed breaker reporting transitions to `telemetry`.
    pub fn new(telemetry: TelemetryEmitter) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window: OutcomeWindow::default(),
                opened_at: None,
                probe_in_flight: false,
            }),
            telemetry,
        }
    }

    // Every mutation leaves the triple consistent before unlocking, so a
    // poisoned lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state. Does not perform the lazy Open → Half-Open move.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consistent view of the full state.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.window.failures(),
            request_count: inner.window.volume(),
            window_start: inner.window.start(),
            opened_at: inner.opened_at,
            probe_in_flight: inner.probe_in_flight,
        }
    }

    /// Ask for admission. At most one probe is handed out while Half-Open.
    pub fn try_admit(self: &Arc<Self>, policy: Arc<ValidationPolicy>) -> Admission {
        let now = Instant::now();
        let mut transition = None;

        let decision = {
            let mut inner = self.lock();
            match inner.state {
                CircuitState::Closed => Ok(false),
                CircuitState::Open => {
                    let elapsed = inner
                        .opened_at
                        .map(|at| now.saturating_duration_since(at))
                        .unwrap_or(Duration::MAX);
                    if elapsed >= policy.break_duration() {
                        transition = Some(inner.transition(CircuitState::HalfOpen, now));
                        inner.probe_in_flight = true;
                        Ok(true)
                    } else {
                        Err(CircuitState::Open)
                    }
                }
                CircuitState::HalfOpen => {
                    if inner.probe_in_flight {
                        Err(CircuitState::HalfOpen)
                    } else {
                        inner.probe_in_flight = true;
                        Ok(true)
                    }
                }
            }
        };

        if let Some(t) = transition {
            self.announce(t);
        }

        match decision {
            Ok(probe) => Admission::Admitted(BreakerPermit {
                breaker: Arc::clone(self),
                policy,
                probe,
                recorded: false,
            }),
            Err(state) => Admission::Rejected(state),
        }
    }

    fn record(&self, probe: bool, success: bool, policy: &ValidationPolicy) {
        let now = Instant::now();

        let transition = {
            let mut inner = self.lock();
            if probe {
                inner.probe_in_flight = false;
                if inner.state != CircuitState::HalfOpen {
                    None
                } else if success {
                    Some(inner.transition(CircuitState::Closed, now))
                } else {
                    Some(inner.transition(CircuitState::Open, now))
                }
            } else if inner.state == CircuitState::Closed {
                inner.window.prune(now, policy.sampling_window());
                inner.window.push(Outcome { at: now, failed: !success });

                let failures = inner.window.failures();
                let volume = inner.window.volume();
                if !success
                    && failures >= policy.failure_threshold
                    && volume >= policy.minimum_throughput
                {
                    Some(inner.transition(CircuitState::Open, now))
                } else {
                    None
                }
            } else {
                // Late outcome from a call admitted before the circuit opened.
                None
            }
        };

        if let Some(t) = transition {
            self.announce(t);
        }
    }

    fn announce(&self, transition: Transition) {
        match transition.to {
            CircuitState::Open => tracing::warn!(
                from = %transition.from,
                to = %transition.to,
                "Inventory circuit opened"
            ),
            _ => tracing::info!(
                from = %transition.from,
                to = %transition.to,
                "Inventory circuit state changed"
            ),
        }
        self.telemetry.emit_transition(transition.from, transition.to);
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(TelemetryEmitter::disabled())
    }
}

/// Admission ticket for one call.
///
/// Dropping the probe ticket without [`BreakerPermit::record`] reopens the
/// circuit. Other tickets leave the window untouched when dropped.
#[derive(Debug)]
pub struct BreakerPermit {
    breaker: Arc<CircuitBreaker>,
    policy: Arc<ValidationPolicy>,
    probe: bool,
    recorded: bool,
}

impl BreakerPermit {
    /// Whether this call is the Half-Open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// Report the outcome of the admitted call.
    pub fn record(mut self, success: bool) {
        self.recorded = true;
        self.breaker.record(self.probe, success, &self.policy);
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        // A cancelled caller says nothing about the authority. Only the probe
        // slot has to be released; it goes back to Open.
        if !self.recorded && self.probe {
            tracing::debug!("Breaker probe dropped without outcome");
            self.breaker.record(true, false, &self.policy);
        }
    }
}
