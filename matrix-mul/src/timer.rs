//! Explicit phase stopwatches.

use std::time::{Duration, Instant};

/// A stopwatch started at construction.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Wall-clock time of the phases of a hybrid run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseTimings {
    /// Compute plus collection.
    pub total: Duration,
    pub compute: Duration,
    /// Collection of the partial results on the coordinator.
    pub comm: Duration,
}

/// Formats a duration as seconds with six decimals.
pub fn secs(d: Duration) -> String {
    format!("{:.6}", d.as_secs_f64())
}
