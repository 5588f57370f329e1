//! # Latency Window
//!
//! Fixed-capacity FIFO of stage durations with mean/max queries.
//!
//! Pushing into a full window evicts the oldest sample. Statistics are always
//! computed over whatever the window currently holds; reading them never
//! clears it.
//!
//! ```
//! use joydrive::telemetry::window::LatencyWindow;
//! use std::time::Duration;
//!
//! let mut window = LatencyWindow::new(2);
//! window.push(Duration::from_millis(10));
//! window.push(Duration::from_millis(20));
//! window.push(Duration::from_millis(30)); // evicts 10 ms
//!
//! assert_eq!(window.mean(), Duration::from_millis(25));
//! assert_eq!(window.max(), Duration::from_millis(30));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling window of durations.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    /// Creates an empty window. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Duration> {
        self.samples.back().copied()
    }

    /// Mean of the window; zero when empty.
    #[must_use]
    pub fn mean(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    /// Largest sample in the window; zero when empty.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.samples.iter().copied()
    }
}
