// src/analytics/aggregator.rs
//! Snapshot Aggregator
//!
//! Reduces a batch of block records into a single summary. An empty batch is
//! a legitimate degenerate case and yields the all-zero summary.

use serde::{Deserialize, Serialize};

use crate::source::BlockRecord;

/// Aggregate over a batch of blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Number of blocks analyzed
    pub blocks_analyzed: usize,

    /// Total transactions across all blocks
    pub total_transactions: u64,

    /// Successful transactions as a percentage of all transactions
    pub success_rate: f64,

    /// Average transactions per block
    pub avg_tx_per_block: f64,

    /// Average fee per transaction.
    ///
    /// Always 0: block records carry no per-transaction fee data. A zero here
    /// does not mean no fees were paid.
    pub avg_fee_per_tx: f64,
}

/// Summarize a batch of block records
pub fn summarize_blocks(blocks: &[BlockRecord]) -> BlockSummary {
    if blocks.is_empty() {
        return BlockSummary::default();
    }

    let total_transactions: u64 = blocks.iter().map(|b| b.transaction_count).sum();
    let successful: u64 = blocks.iter().map(|b| b.successful_transactions).sum();

    // Pooled over all blocks, not averaged per block
    let success_rate = if total_transactions > 0 {
        (successful as f64 / total_transactions as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    BlockSummary {
        blocks_analyzed: blocks.len(),
        total_transactions,
        success_rate,
        avg_tx_per_block: total_transactions as f64 / blocks.len() as f64,
        avg_fee_per_tx: 0.0,
    }
}
