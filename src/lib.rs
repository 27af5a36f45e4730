// src/lib.rs
//! solana-pulse - Network Activity Analytics
//!
//! This crate samples recent Solana network activity and turns it into
//! ranked, annotated and anomaly-flagged snapshots:
//! - Ledger data sources (JSON-RPC)
//! - Label directory for well-known programs
//! - Analytics engine (aggregation, ranking, baseline, anomaly rules)
//! - Poll-loop monitoring and terminal reports

pub mod analytics;
pub mod config;
pub mod error_handling;
pub mod labels;
pub mod monitoring;
pub mod source;

pub use analytics::{
    AnalyticsEngine, Anomaly, AnomalyKind, BlockSummary, EngineConfig, HistoricalDataPoint,
    NetworkSnapshot, ProgramRanking, Severity,
};
pub use config::PulseConfig;
pub use error_handling::{PulseError, PulseResult, SourceError};
pub use labels::{resolve_label, ProgramCategory, ProgramLabel};
pub use monitoring::{MonitorConfig, MonitorEvent, SnapshotMonitor};
pub use source::{
    BlockRecord, BlockWindow, EpochProgress, InvocationCounts, LedgerDataSource, NetworkStats,
    RpcDataSource, SignatureRecord,
};
