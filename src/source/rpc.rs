// src/source/rpc.rs
//! JSON-RPC data source
//!
//! Talks to a Solana JSON-RPC 2.0 endpoint over HTTP. Blocks of a window are
//! fetched concurrently, at most `max_concurrent_requests` at a time. A slot the node has no block for (skipped slot,
//! pruned ledger) is omitted from the window; a transport failure fails the
//! whole call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    BlockRecord, BlockWindow, EpochProgress, InvocationCounts, LedgerDataSource, NetworkStats, SignatureRecord,
};
use crate::error_handling::SourceError;

/// Default cap on in-flight `getBlock` requests
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

/// RPC data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcDataSourceConfig {
    /// Endpoint URL
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Number of performance samples averaged into the TPS estimate
    pub performance_samples: usize,

    /// Maximum number of `getBlock` requests in flight at once
    pub max_concurrent_requests: usize,
}

impl Default for RpcDataSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            timeout_secs: 30,
            performance_samples: 5,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

/// Solana JSON-RPC data source
pub struct RpcDataSource {
    /// HTTP client
    client: Client,

    /// Configuration
    config: RpcDataSourceConfig,

    /// Next JSON-RPC request id
    next_id: AtomicU64,
}

impl RpcDataSource {
    /// Create a new RPC data source
    pub fn new(config: RpcDataSourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("solana-pulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config, next_id: AtomicU64::new(1) })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Issue a call whose `result` may legitimately be null
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, SourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.client.post(&self.config.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http { url: self.config.url.clone(), status: status.as_u16() });
        }

        let body = response.bytes().await?;
        let envelope: RpcResponse<T> = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Decode(format!("{}: {}", method, e)))?;

        if let Some(error) = envelope.error {
            return Err(SourceError::Rpc { code: error.code, message: error.message });
        }

        Ok(envelope.result)
    }

    /// Issue a call that must return a result
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SourceError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| SourceError::Decode(format!("{} returned no result", method)))
    }

    async fn fetch_block(&self, slot: u64) -> Result<Option<RpcBlock>, SourceError> {
        self.call_optional(
            "getBlock",
            json!([slot, {
                "encoding": "json",
                "transactionDetails": "full",
                "rewards": false,
                "maxSupportedTransactionVersion": 0,
            }]),
        )
        .await
    }

    /// Fetch the blocks of the `count` most recent slots, oldest first
    async fn fetch_window(&self, count: usize) -> Result<Vec<(u64, RpcBlock)>, SourceError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let tip: u64 = self.call("getSlot", json!([])).await?;
        let start = tip.saturating_sub(count as u64 - 1);
        let slots: Vec<u64> = (start..=tip).collect();

        // `buffered` keeps results in slot order
        let results: Vec<_> = stream::iter(slots.iter().copied().map(|slot| self.fetch_block(slot)))
            .buffered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut blocks = Vec::with_capacity(slots.len());
        for (slot, result) in slots.into_iter().zip(results) {
            match result {
                Ok(Some(block)) => blocks.push((slot, block)),
                Ok(None) => debug!("Slot {} has no block, skipping", slot),
                Err(SourceError::Rpc { code, message }) => {
                    debug!("Slot {} unavailable ({}: {}), skipping", slot, code, message)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(blocks)
    }
}

#[async_trait]
impl LedgerDataSource for RpcDataSource {
    async fn fetch_network_stats(&self) -> Result<NetworkStats, SourceError> {
        let (epoch_info, samples, vote_accounts, slot) = tokio::try_join!(
            self.call::<RpcEpochInfo>("getEpochInfo", json!([])),
            self.call::<Vec<RpcPerformanceSample>>(
                "getRecentPerformanceSamples",
                json!([self.config.performance_samples]),
            ),
            self.call::<RpcVoteAccounts>("getVoteAccounts", json!([])),
            self.call::<u64>("getSlot", json!([])),
        )?;

        Ok(NetworkStats {
            slot,
            block_height: epoch_info.block_height,
            epoch: EpochProgress {
                epoch: epoch_info.epoch,
                slot_index: epoch_info.slot_index,
                slots_in_epoch: epoch_info.slots_in_epoch,
                absolute_slot: epoch_info.absolute_slot,
                transaction_count: epoch_info.transaction_count,
            },
            tps: estimate_tps(&samples),
            validator_count: vote_accounts.current.len(),
        })
    }

    async fn fetch_recent_blocks(&self, count: usize) -> Result<Vec<BlockRecord>, SourceError> {
        let blocks = self.fetch_window(count).await?;
        Ok(blocks.iter().map(|(slot, block)| block_record(*slot, block)).collect())
    }

    async fn fetch_invocation_counts(&self, count: usize) -> Result<InvocationCounts, SourceError> {
        let blocks = self.fetch_window(count).await?;
        let mut counts = InvocationCounts::new();
        for (_, block) in &blocks {
            count_invocations(block, &mut counts);
        }
        Ok(counts)
    }

    /// One `getSlot` and one `getBlock` per slot, shared by both results
    async fn fetch_block_window(&self, count: usize) -> Result<BlockWindow, SourceError> {
        let blocks = self.fetch_window(count).await?;
        let mut window = BlockWindow::default();
        for (slot, block) in &blocks {
            window.blocks.push(block_record(*slot, block));
            count_invocations(block, &mut window.counts);
        }
        Ok(window)
    }

    async fn fetch_transaction_history(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, SourceError> {
        let signatures: Vec<RpcSignatureInfo> = self
            .call("getSignaturesForAddress", json!([identifier, { "limit": limit }]))
            .await?;

        Ok(signatures
            .into_iter()
            .map(|s| SignatureRecord {
                signature: s.signature,
                slot: s.slot,
                block_time: s.block_time,
                succeeded: s.err.is_none(),
                memo: s.memo,
            })
            .collect())
    }
}

/// Transactions per second over the given performance samples
fn estimate_tps(samples: &[RpcPerformanceSample]) -> f64 {
    let transactions: u64 = samples.iter().map(|s| s.num_transactions).sum();
    let seconds: u64 = samples.iter().map(|s| s.sample_period_secs).sum();
    if seconds == 0 {
        return 0.0;
    }
    transactions as f64 / seconds as f64
}

fn block_record(slot: u64, block: &RpcBlock) -> BlockRecord {
    let transaction_count = block.transactions.len() as u64;
    let successful_transactions = block
        .transactions
        .iter()
        .filter(|tx| tx.meta.as_ref().map_or(true, |meta| meta.err.is_none()))
        .count() as u64;

    BlockRecord {
        slot,
        transaction_count,
        successful_transactions,
        failed_transactions: transaction_count - successful_transactions,
        block_time: block.block_time,
    }
}

fn count_invocations(block: &RpcBlock, counts: &mut InvocationCounts) {
    for tx in &block.transactions {
        let message = &tx.transaction.message;
        for instruction in &message.instructions {
            // An index outside the static keys means a malformed message
            if let Some(program_id) = message.account_keys.get(instruction.program_id_index) {
                *counts.entry(program_id.clone()).or_insert(0) += 1;
            }
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,

    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcEpochInfo {
    absolute_slot: u64,
    block_height: u64,
    epoch: u64,
    slot_index: u64,
    slots_in_epoch: u64,
    #[serde(default)]
    transaction_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcPerformanceSample {
    num_transactions: u64,
    sample_period_secs: u64,
}

#[derive(Debug, Deserialize)]
struct RpcVoteAccounts {
    #[serde(default)]
    current: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    #[serde(default)]
    block_time: Option<i64>,

    #[serde(default)]
    transactions: Vec<RpcTransactionWithMeta>,
}

#[derive(Debug, Deserialize)]
struct RpcTransactionWithMeta {
    transaction: RpcTransaction,

    #[serde(default)]
    meta: Option<RpcTransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    message: RpcMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMessage {
    account_keys: Vec<String>,

    #[serde(default)]
    instructions: Vec<RpcInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcInstruction {
    program_id_index: usize,
}

#[derive(Debug, Deserialize)]
struct RpcTransactionMeta {
    #[serde(default)]
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureInfo {
    signature: String,
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    block_time: Option<i64>,
}
