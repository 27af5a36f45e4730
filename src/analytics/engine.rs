// src/analytics/engine.rs
//! Analytics Engine
//!
//! Orchestrates one snapshot round: fetch, aggregate, rank, evaluate the
//! anomaly rules, then fold the round into the engine's state (history,
//! baseline, known programs).
//!
//! An engine has a single logical owner. `take_snapshot` takes `&mut self`,
//! so concurrent callers must serialize or own separate engines.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::aggregator::{summarize_blocks, BlockSummary};
use super::anomaly::{evaluate, Anomaly, RuleContext};
use super::baseline::{BaselineTracker, DEFAULT_SMOOTHING_FACTOR};
use super::history::{HistoricalDataPoint, HistoryRing, DEFAULT_HISTORY_CAPACITY};
use super::ranking::{rank_programs, ProgramRanking, DEFAULT_RANKING_LIMIT};
use crate::error_handling::PulseResult;
use crate::source::{BlockWindow, LedgerDataSource, NetworkStats};

/// Default number of blocks sampled per snapshot
pub const DEFAULT_BLOCK_WINDOW: usize = 5;

/// Analytics engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// History ring capacity
    pub history_capacity: usize,

    /// EWMA smoothing factor for the TPS baseline
    pub smoothing_factor: f64,

    /// Number of ranked programs returned per snapshot
    pub ranking_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

/// Result of one snapshot round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Snapshot time
    pub timestamp: DateTime<Utc>,

    /// Network statistics
    pub stats: NetworkStats,

    /// Most invoked programs
    pub top_programs: Vec<ProgramRanking>,

    /// Block summary
    pub block_summary: BlockSummary,

    /// Anomalies, in rule order
    pub anomalies: Vec<Anomaly>,
}

/// Analytics engine
pub struct AnalyticsEngine<S> {
    /// Data source
    source: S,

    /// Configuration
    config: EngineConfig,

    /// Past rounds
    history: HistoryRing,

    /// TPS baseline
    baseline: BaselineTracker,

    /// Every program observed so far
    known_programs: HashSet<String>,
}

impl<S: LedgerDataSource> AnalyticsEngine<S> {
    /// Create a new analytics engine with the default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    /// Create a new analytics engine with the given configuration
    pub fn with_config(source: S, config: EngineConfig) -> Self {
        Self {
            source,
            history: HistoryRing::new(config.history_capacity),
            baseline: BaselineTracker::new(config.smoothing_factor),
            known_programs: HashSet::new(),
            config,
        }
    }

    /// Sample the `window` most recent blocks and produce a snapshot.
    ///
    /// Any fetch failure fails the whole call and leaves the engine state
    /// untouched.
    pub async fn take_snapshot(&mut self, window: usize) -> PulseResult<NetworkSnapshot> {
        let (stats, BlockWindow { blocks, counts }) = tokio::try_join!(
            self.source.fetch_network_stats(),
            self.source.fetch_block_window(window),
        )?;
        debug!(
            "Fetched slot {} with {} blocks and {} programs over a window of {}",
            stats.slot,
            blocks.len(),
            counts.len(),
            window
        );

        let timestamp = Utc::now();
        let block_summary = summarize_blocks(&blocks);
        let top_programs = rank_programs(&counts, self.config.ranking_limit);

        let anomalies = evaluate(&RuleContext {
            stats: &stats,
            summary: &block_summary,
            rankings: &top_programs,
            counts: &counts,
            baseline: self.baseline.current(),
            history: &self.history,
            known_programs: &self.known_programs,
            timestamp,
        });
        for anomaly in &anomalies {
            warn!("[{}] {}: {}", anomaly.severity, anomaly.kind, anomaly.message);
        }

        self.known_programs.extend(counts.keys().cloned());
        self.history.push(HistoricalDataPoint {
            timestamp,
            tps: stats.tps,
            total_transactions: block_summary.total_transactions,
            success_rate: block_summary.success_rate,
            program_counts: counts,
        });
        let baseline = self.baseline.observe(stats.tps);

        info!(
            "Snapshot at slot {}: {:.0} TPS (baseline {:.0}), {} txs in {} blocks, {:.1}% success, {} anomalies",
            stats.slot,
            stats.tps,
            baseline,
            block_summary.total_transactions,
            block_summary.blocks_analyzed,
            block_summary.success_rate,
            anomalies.len()
        );

        Ok(NetworkSnapshot { timestamp, stats, top_programs, block_summary, anomalies })
    }

    /// Copy of the retained history, oldest first
    pub fn history(&self) -> Vec<HistoricalDataPoint> {
        self.history.to_vec()
    }

    /// Current TPS baseline, `None` before the first snapshot
    pub fn baseline_tps(&self) -> Option<f64> {
        self.baseline.current()
    }

    /// Number of distinct programs observed so far
    pub fn known_program_count(&self) -> usize {
        self.known_programs.len()
    }

    /// Whether the program has been observed in any round
    pub fn has_seen_program(&self, program_id: &str) -> bool {
        self.known_programs.contains(program_id)
    }
}
