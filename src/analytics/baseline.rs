// src/analytics/baseline.rs
//! Baseline Tracker
//!
//! Exponentially-weighted moving average of throughput across snapshots.
//! The first observation initializes the baseline directly.

/// Default smoothing factor: each observation contributes 10%
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.1;

/// EWMA of observed TPS
#[derive(Debug, Clone)]
pub struct BaselineTracker {
    /// Current baseline, `None` until the first observation
    value: Option<f64>,

    /// Weight of a new observation
    alpha: f64,
}

impl BaselineTracker {
    /// Create a tracker with the given smoothing factor
    pub fn new(alpha: f64) -> Self {
        Self { value: None, alpha }
    }

    /// Current baseline
    pub fn current(&self) -> Option<f64> {
        self.value
    }

    /// Fold an observation into the baseline and return the new value
    pub fn observe(&mut self, observed: f64) -> f64 {
        let next = match self.value {
            Some(baseline) => baseline * (1.0 - self.alpha) + observed * self.alpha,
            None => observed,
        };
        self.value = Some(next);
        next
    }
}

impl Default for BaselineTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}
