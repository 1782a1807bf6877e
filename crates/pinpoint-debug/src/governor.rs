//! Per-request time and memory budget for probe handlers.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Tracks what handlers have cost the current request.
///
/// Once either budget is exceeded every later fire is refused. Results
/// recorded before that point are kept.
#[derive(Debug, Clone)]
pub struct Governor {
    max_time: Duration,
    max_memory: usize,
    time_spent: Duration,
    memory_used: usize,
    fired: u32,
    skipped: u32,
    exhausted_logged: bool,
}

impl Governor {
    #[must_use]
    pub fn new(max_time: Duration, max_memory: usize) -> Self {
        Self {
            max_time,
            max_memory,
            time_spent: Duration::ZERO,
            memory_used: 0,
            fired: 0,
            skipped: 0,
            exhausted_logged: false,
        }
    }

    /// Whether a handler may run now. Refusals are counted.
    pub fn admit(&mut self) -> bool {
        if !self.is_exhausted() {
            self.fired = self.fired.saturating_add(1);
            return true;
        }
        self.skipped = self.skipped.saturating_add(1);
        if !self.exhausted_logged {
            self.exhausted_logged = true;
            debug!(
                "debugger budget exhausted: {:?} of {:?}, {} of {} bytes",
                self.time_spent, self.max_time, self.memory_used, self.max_memory
            );
        }
        false
    }

    /// Adds the cost of one handler run.
    pub fn charge(&mut self, elapsed: Duration, bytes: usize) {
        self.time_spent = self.time_spent.saturating_add(elapsed);
        self.memory_used = self.memory_used.saturating_add(bytes);
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.time_spent > self.max_time || self.memory_used > self.max_memory
    }

    #[must_use]
    pub fn time_spent(&self) -> Duration {
        self.time_spent
    }

    #[must_use]
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    #[must_use]
    pub fn max_time(&self) -> Duration {
        self.max_time
    }

    #[must_use]
    pub fn max_memory(&self) -> usize {
        self.max_memory
    }

    #[must_use]
    pub fn fired(&self) -> u32 {
        self.fired
    }

    #[must_use]
    pub fn skipped(&self) -> u32 {
        self.skipped
    }
}

/// What one request spent on debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    /// Handler time, in microseconds.
    pub handler_time_us: u64,
    pub memory_used: usize,
    pub fired: u32,
    pub skipped: u32,
}

impl From<&Governor> for RequestSummary {
    fn from(governor: &Governor) -> Self {
        Self {
            handler_time_us: u64::try_from(governor.time_spent.as_micros()).unwrap_or(u64::MAX),
            memory_used: governor.memory_used,
            fired: governor.fired,
            skipped: governor.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_budget_closes_gate() {
        let mut governor = Governor::new(Duration::from_millis(5), 1024);
        assert!(governor.admit());
        governor.charge(Duration::from_millis(5), 0);
        // Equal to the budget is still within it.
        assert!(governor.admit());
        governor.charge(Duration::from_micros(1), 0);
        assert!(!governor.admit());
        assert!(!governor.admit());

        let summary = RequestSummary::from(&governor);
        assert_eq!(summary.fired, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.handler_time_us, 5_001);
    }

    #[test]
    fn test_memory_budget_closes_gate() {
        let mut governor = Governor::new(Duration::from_secs(1), 100);
        governor.charge(Duration::ZERO, 101);
        assert!(governor.is_exhausted());
        assert!(!governor.admit());
    }
}
