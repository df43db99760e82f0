use std::time::{Duration, Instant};

use tracing::warn;

/// Monotonic timer for pose graph optimization cycles.
///
/// `start` records an [`Instant`], `stop` turns the elapsed time into the latest cycle time and
/// adds it to the run's cumulative total. Pairing each `stop` with a preceding `start` is the
/// caller's responsibility: an unpaired `stop` is reported as a warning and measures nothing.
#[derive(Debug, Clone, Default)]
pub struct OptimizationTimer {
    started_at: Option<Instant>,
    latest: Duration,
    total: Duration,
}

impl OptimizationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle, discarding any start that was never stopped
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop the running cycle and return its duration
    pub fn stop(&mut self) -> Duration {
        match self.started_at.take() {
            Some(started_at) => {
                self.latest = started_at.elapsed();
                self.total += self.latest;
                self.latest
            }
            None => {
                warn!("Logging: optimization timer stopped without a matching start");
                Duration::ZERO
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Duration of the most recently stopped cycle
    pub fn latest(&self) -> Duration {
        self.latest
    }

    /// Sum of every stopped cycle since the run began
    pub fn total(&self) -> Duration {
        self.total
    }
}
