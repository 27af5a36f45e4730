// src/source/mod.rs
//! Ledger Data Source
//!
//! This module defines the raw data the analytics engine consumes and the
//! seam through which it is fetched:
//! - Network-wide statistics (slot, epoch progress, throughput, validators)
//! - Per-block production records over a recent window
//! - Per-program invocation counts over the same window
//! - Both of the above from a single pass over the window
//! - Per-identifier transaction history
//!
//! Sources own their timeout and retry policy. The engine never retries.

mod rpc;

pub use rpc::{RpcDataSource, RpcDataSourceConfig, DEFAULT_MAX_CONCURRENT_REQUESTS};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error_handling::SourceError;

/// Invocation count per program identifier over one block window.
///
/// Ordered by identifier so that everything derived from it is deterministic.
pub type InvocationCounts = BTreeMap<String, u64>;

/// Epoch progress counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochProgress {
    /// Epoch number
    pub epoch: u64,

    /// Slot index within the epoch
    pub slot_index: u64,

    /// Number of slots in the epoch
    pub slots_in_epoch: u64,

    /// Monotonically increasing absolute slot
    pub absolute_slot: u64,

    /// Lifetime transaction count, when the node reports it
    pub transaction_count: Option<u64>,
}

impl EpochProgress {
    /// Percentage of the epoch already elapsed
    pub fn progress_percent(&self) -> f64 {
        if self.slots_in_epoch == 0 {
            return 0.0;
        }
        (self.slot_index as f64 / self.slots_in_epoch as f64 * 100.0).min(100.0)
    }
}

/// Chain-wide counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Current slot
    pub slot: u64,

    /// Current block height
    pub block_height: u64,

    /// Epoch progress
    pub epoch: EpochProgress,

    /// Estimated transactions per second
    pub tps: f64,

    /// Number of active validators
    pub validator_count: usize,
}

/// One sampled block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Slot of the block
    pub slot: u64,

    /// Number of transactions
    pub transaction_count: u64,

    /// Transactions that executed successfully
    pub successful_transactions: u64,

    /// Transactions that failed
    pub failed_transactions: u64,

    /// Unix timestamp of the block, if known
    pub block_time: Option<i64>,
}

/// Block records and invocation counts drawn from the same window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    /// Blocks in the window, oldest first
    pub blocks: Vec<BlockRecord>,

    /// Invocation counts over the same blocks
    pub counts: InvocationCounts,
}

/// One entry of an identifier's transaction history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Transaction signature
    pub signature: String,

    /// Slot the transaction landed in
    pub slot: u64,

    /// Unix timestamp, if known
    pub block_time: Option<i64>,

    /// Whether the transaction succeeded
    pub succeeded: bool,

    /// Attached memo, if any
    pub memo: Option<String>,
}

/// Supplier of raw ledger data
#[async_trait]
pub trait LedgerDataSource: Send + Sync {
    /// Fetch chain-wide statistics
    async fn fetch_network_stats(&self) -> Result<NetworkStats, SourceError>;

    /// Fetch the `count` most recent blocks, oldest first.
    ///
    /// Heights the source has no data for are omitted, not reported as errors.
    async fn fetch_recent_blocks(&self, count: usize) -> Result<Vec<BlockRecord>, SourceError>;

    /// Count program invocations over the `count` most recent blocks
    async fn fetch_invocation_counts(&self, count: usize) -> Result<InvocationCounts, SourceError>;

    /// Fetch block records and invocation counts for the `count` most recent
    /// blocks.
    ///
    /// The default issues both fetches concurrently and fails if either does.
    /// Sources that can derive both from one pass over the blocks override it.
    async fn fetch_block_window(&self, count: usize) -> Result<BlockWindow, SourceError> {
        let (blocks, counts) = tokio::try_join!(
            self.fetch_recent_blocks(count),
            self.fetch_invocation_counts(count),
        )?;
        Ok(BlockWindow { blocks, counts })
    }

    /// Fetch up to `limit` recent transactions touching `identifier`, newest first
    async fn fetch_transaction_history(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, SourceError>;
}

#[async_trait]
impl<T: LedgerDataSource + ?Sized> LedgerDataSource for std::sync::Arc<T> {
    async fn fetch_network_stats(&self) -> Result<NetworkStats, SourceError> {
        (**self).fetch_network_stats().await
    }

    async fn fetch_recent_blocks(&self, count: usize) -> Result<Vec<BlockRecord>, SourceError> {
        (**self).fetch_recent_blocks(count).await
    }

    async fn fetch_invocation_counts(&self, count: usize) -> Result<InvocationCounts, SourceError> {
        (**self).fetch_invocation_counts(count).await
    }

    async fn fetch_block_window(&self, count: usize) -> Result<BlockWindow, SourceError> {
        (**self).fetch_block_window(count).await
    }

    async fn fetch_transaction_history(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, SourceError> {
        (**self).fetch_transaction_history(identifier, limit).await
    }
}
