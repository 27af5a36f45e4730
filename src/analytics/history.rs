// src/analytics/history.rs
//! History Ring
//!
//! Bounded, insertion-ordered record of past snapshots' key statistics.
//! Once full, the oldest entry is evicted first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::InvocationCounts;

/// Default ring capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Key statistics retained from one past snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    /// Snapshot timestamp
    pub timestamp: DateTime<Utc>,

    /// Observed TPS
    pub tps: f64,

    /// Transactions in the sampled window
    pub total_transactions: u64,

    /// Success rate in the sampled window
    pub success_rate: f64,

    /// Invocation counts observed that round
    pub program_counts: InvocationCounts,
}

/// Fixed-capacity FIFO of historical data points
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoricalDataPoint>,
    capacity: usize,
}

impl HistoryRing {
    /// Create an empty ring
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a point, evicting the oldest entries beyond capacity
    pub fn push(&mut self, point: HistoricalDataPoint) {
        self.entries.push_back(point);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Number of retained points
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent point
    pub fn latest(&self) -> Option<&HistoricalDataPoint> {
        self.entries.back()
    }

    /// The `n` most recent points, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoricalDataPoint> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    /// Owned copy of all points, oldest first
    pub fn to_vec(&self) -> Vec<HistoricalDataPoint> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
