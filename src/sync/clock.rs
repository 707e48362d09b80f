//! Clock abstraction and command suppression window
//!
//! Reconciliation against the OS is time-boxed: after a local command the
//! session manager can report stale transport state for several seconds, so
//! periodic refresh passes are skipped until the window elapses. The clock is
//! injected so the race is testable deterministically.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time for reconciliation decisions
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Manually advanced clock for deterministic tests
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move time forward by the given amount
    pub fn advance(&self, delta: Duration) {
        *self.offset.lock() += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

/// Tracks the time of the last local command and gates reconciliation
/// against external state until the suppression window has elapsed
#[derive(Debug, Clone)]
pub struct SuppressionGate {
    window: Duration,
    last_command: Option<Instant>,
}

impl SuppressionGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_command: None,
        }
    }

    /// Stamp a local command at the given time
    pub fn record_command(&mut self, now: Instant) {
        self.last_command = Some(now);
    }

    /// Whether reconciliation must be skipped at the given time
    ///
    /// Returns false if no command has ever been recorded.
    pub fn is_suppressed(&self, now: Instant) -> bool {
        match self.last_command {
            Some(at) => now.saturating_duration_since(at) < self.window,
            None => false,
        }
    }

    /// Time since the last local command, if any
    pub fn elapsed_since_command(&self, now: Instant) -> Option<Duration> {
        self.last_command
            .map(|at| now.saturating_duration_since(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_open_before_any_command() {
        let clock = ManualClock::new();
        let gate = SuppressionGate::new(Duration::from_secs(10));
        assert!(!gate.is_suppressed(clock.now()));
    }

    #[test]
    fn gate_closes_after_command_and_reopens_after_window() {
        let clock = ManualClock::new();
        let mut gate = SuppressionGate::new(Duration::from_secs(10));

        gate.record_command(clock.now());
        assert!(gate.is_suppressed(clock.now()));

        clock.advance(Duration::from_secs(3));
        assert!(gate.is_suppressed(clock.now()));

        clock.advance(Duration::from_secs(7));
        assert!(!gate.is_suppressed(clock.now()));
    }

    #[test]
    fn new_command_restarts_the_window() {
        let clock = ManualClock::new();
        let mut gate = SuppressionGate::new(Duration::from_secs(10));

        gate.record_command(clock.now());
        clock.advance(Duration::from_secs(9));
        gate.record_command(clock.now());
        clock.advance(Duration::from_secs(5));

        assert!(gate.is_suppressed(clock.now()));
        assert_eq!(
            gate.elapsed_since_command(clock.now()),
            Some(Duration::from_secs(5))
        );
    }
}
