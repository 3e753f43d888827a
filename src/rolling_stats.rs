//! Rolling statistics over the truth-delta time series
//!
//! Maintains a bounded FIFO window of the most recent delta samples and
//! derives mean / standard deviation for the adaptive threshold controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of samples retained in the rolling window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// One observation of the truth-delta signal. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthDeltaSample {
    pub timestamp: DateTime<Utc>,
    pub magnitude: f64,
}

impl TruthDeltaSample {
    pub fn new(timestamp: DateTime<Utc>, magnitude: f64) -> Self {
        Self {
            timestamp,
            magnitude,
        }
    }
}

/// Bounded history of truth-delta samples with derived statistics.
///
/// Standard deviation is the sample standard deviation (divide by n-1 for
/// n > 1, 0 otherwise).
#[derive(Debug, Clone)]
pub struct RollingStatisticsTracker {
    window: VecDeque<TruthDeltaSample>,
    capacity: usize,
}

impl RollingStatisticsTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild a tracker from persisted samples, keeping only the most
    /// recent `capacity` entries.
    pub fn from_samples(samples: Vec<TruthDeltaSample>, capacity: usize) -> Self {
        let mut tracker = Self::new(capacity);
        for sample in samples {
            tracker.record(sample);
        }
        tracker
    }

    /// Append a sample, evicting the oldest once capacity is exceeded.
    pub fn record(&mut self, sample: TruthDeltaSample) {
        self.window.push_back(sample);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.window.iter().map(|s| s.magnitude).sum();
        sum / self.window.len() as f64
    }

    pub fn stddev(&self) -> f64 {
        let n = self.window.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance: f64 = self
            .window
            .iter()
            .map(|s| {
                let d = s.magnitude - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    }

    /// Current window contents, oldest first.
    pub fn samples(&self) -> Vec<TruthDeltaSample> {
        self.window.iter().copied().collect()
    }
}

impl Default for RollingStatisticsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(magnitude: f64) -> TruthDeltaSample {
        TruthDeltaSample::new(Utc::now(), magnitude)
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut tracker = RollingStatisticsTracker::new(30);
        for i in 0..45 {
            tracker.record(sample(i as f64));
            assert!(tracker.sample_count() <= 30);
        }
        // After 45 inserts the window holds exactly the last 30.
        assert_eq!(tracker.sample_count(), 30);
        let magnitudes: Vec<f64> = tracker.samples().iter().map(|s| s.magnitude).collect();
        assert_eq!(magnitudes[0], 15.0);
        assert_eq!(magnitudes[29], 44.0);
    }

    #[test]
    fn mean_and_stddev_of_known_series() {
        let mut tracker = RollingStatisticsTracker::new(10);
        for m in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            tracker.record(sample(m));
        }
        assert!((tracker.mean() - 5.0).abs() < 1e-12);
        // Sample stddev of the classic series: sqrt(32/7).
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((tracker.stddev() - expected).abs() < 1e-12);
    }

    #[test]
    fn stddev_is_zero_below_two_samples() {
        let mut tracker = RollingStatisticsTracker::default();
        assert_eq!(tracker.stddev(), 0.0);
        tracker.record(sample(0.42));
        assert_eq!(tracker.stddev(), 0.0);
        assert_eq!(tracker.mean(), 0.42);
    }

    #[test]
    fn from_samples_respects_capacity() {
        let samples: Vec<TruthDeltaSample> = (0..40).map(|i| sample(i as f64)).collect();
        let tracker = RollingStatisticsTracker::from_samples(samples, 30);
        assert_eq!(tracker.sample_count(), 30);
        assert_eq!(tracker.samples()[0].magnitude, 10.0);
    }
}
