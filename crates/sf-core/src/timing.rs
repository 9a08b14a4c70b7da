//! Scan duration statistics.

use std::time::Duration;

/// Running min / max / mean over recorded durations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationStats {
    count: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

impl DurationStats {
    pub const fn new() -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            min: None,
            max: Duration::ZERO,
        }
    }

    /// Record one measurement.
    pub fn record(&mut self, d: Duration) {
        self.count += 1;
        self.total = self.total.saturating_add(d);
        self.min = Some(self.min.map_or(d, |m| m.min(d)));
        self.max = self.max.max(d);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Shortest recorded duration, zero if nothing was recorded.
    pub fn min(&self) -> Duration {
        self.min.unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Average duration, zero if nothing was recorded.
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.count as f64),
        }
    }
}
