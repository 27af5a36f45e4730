// src/analytics/mod.rs
//! Analytics Module for solana-pulse
//!
//! This module turns raw ledger samples into insight:
//! - Block aggregation
//! - Program ranking
//! - TPS baseline tracking
//! - Bounded snapshot history
//! - Anomaly detection
//!
//! `AnalyticsEngine` ties the pieces together behind `take_snapshot`.

pub mod aggregator;
pub mod anomaly;
pub mod baseline;
pub mod engine;
pub mod history;
pub mod ranking;

pub use aggregator::{summarize_blocks, BlockSummary};
pub use anomaly::{Anomaly, AnomalyKind, RuleContext, RuleFn, Severity, RULES};
pub use baseline::BaselineTracker;
pub use engine::{AnalyticsEngine, EngineConfig, NetworkSnapshot, DEFAULT_BLOCK_WINDOW};
pub use history::{HistoricalDataPoint, HistoryRing};
pub use ranking::{rank_programs, ProgramRanking};
