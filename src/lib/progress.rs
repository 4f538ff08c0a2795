//! Progress logging shared by worker threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::info;

use crate::logging::{format_count, format_duration};

/// Counts completed work items and logs each time the count crosses a multiple of the
/// interval. When a total is known, messages show it.
///
/// ```
/// use svprep_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Scanned partitions").with_interval(10).with_total(25);
/// for _ in 0..25 {
///     tracker.log_if_needed(1); // logs at 10 and 20
/// }
/// tracker.log_final();
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    total: Option<u64>,
    count: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Creates a tracker logging every 100 items.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            interval: 100,
            message: message.into(),
            total: None,
            count: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    fn log(&self, count: u64, suffix: &str) {
        let elapsed = format_duration(self.started.elapsed());
        match self.total {
            Some(total) => {
                info!("{} {}/{} ({elapsed}){suffix}", self.message, format_count(count), format_count(total));
            }
            None => info!("{} {} ({elapsed}){suffix}", self.message, format_count(count)),
        }
    }

    /// Adds to the count and logs once per interval boundary crossed. Returns true if the
    /// new count lies exactly on a boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        let previous = self.count.fetch_add(additional, Ordering::Relaxed);
        let current = previous + additional;
        for boundary in (previous / self.interval + 1)..=(current / self.interval) {
            self.log(boundary * self.interval, "");
        }
        current > 0 && current.is_multiple_of(self.interval)
    }

    /// Logs the final count unless the last boundary already reported it.
    pub fn log_final(&self) {
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            self.log(count, " complete");
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
