//! Scripted in-memory ledger source shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use solana_pulse::{
    BlockRecord, EpochProgress, InvocationCounts, LedgerDataSource, NetworkStats, SignatureRecord,
    SourceError,
};

/// Which fetch should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Stats,
    Blocks,
    Counts,
}

/// Data returned for one round
#[derive(Debug, Clone)]
pub struct Round {
    pub tps: f64,
    pub blocks: Vec<BlockRecord>,
    pub counts: InvocationCounts,
}

impl Round {
    pub fn new(tps: f64) -> Self {
        Self { tps, blocks: vec![block(1, 100, 100)], counts: InvocationCounts::new() }
    }

    pub fn with_blocks(mut self, blocks: Vec<BlockRecord>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_counts(mut self, entries: &[(&str, u64)]) -> Self {
        self.counts = counts(entries);
        self
    }
}

pub fn block(slot: u64, total: u64, successful: u64) -> BlockRecord {
    BlockRecord {
        slot,
        transaction_count: total,
        successful_transactions: successful,
        failed_transactions: total - successful,
        block_time: Some(1_700_000_000 + slot as i64),
    }
}

pub fn counts(entries: &[(&str, u64)]) -> InvocationCounts {
    entries.iter().map(|(id, c)| (id.to_string(), *c)).collect()
}

/// Source whose answers are set by the test between snapshots
pub struct ScriptedSource {
    round: Mutex<Round>,
    failure: Mutex<Option<Failure>>,
}

impl ScriptedSource {
    pub fn new(round: Round) -> Arc<Self> {
        Arc::new(Self { round: Mutex::new(round), failure: Mutex::new(None) })
    }

    pub fn set_round(&self, round: Round) {
        *self.round.lock().unwrap() = round;
    }

    pub fn set_tps(&self, tps: f64) {
        self.round.lock().unwrap().tps = tps;
    }

    pub fn fail(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    fn check(&self, which: Failure) -> Result<(), SourceError> {
        if *self.failure.lock().unwrap() == Some(which) {
            return Err(SourceError::Rpc { code: -32005, message: "Node is unhealthy".to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerDataSource for ScriptedSource {
    async fn fetch_network_stats(&self) -> Result<NetworkStats, SourceError> {
        self.check(Failure::Stats)?;
        let tps = self.round.lock().unwrap().tps;
        Ok(NetworkStats {
            slot: 1_000,
            block_height: 900,
            epoch: EpochProgress {
                epoch: 7,
                slot_index: 1_000,
                slots_in_epoch: 432_000,
                absolute_slot: 1_000,
                transaction_count: None,
            },
            tps,
            validator_count: 42,
        })
    }

    async fn fetch_recent_blocks(&self, count: usize) -> Result<Vec<BlockRecord>, SourceError> {
        self.check(Failure::Blocks)?;
        let blocks = self.round.lock().unwrap().blocks.clone();
        Ok(blocks.into_iter().take(count).collect())
    }

    async fn fetch_invocation_counts(&self, count: usize) -> Result<InvocationCounts, SourceError> {
        self.check(Failure::Counts)?;
        if count == 0 {
            return Ok(InvocationCounts::new());
        }
        Ok(self.round.lock().unwrap().counts.clone())
    }

    async fn fetch_transaction_history(
        &self,
        _identifier: &str,
        _limit: usize,
    ) -> Result<Vec<SignatureRecord>, SourceError> {
        Ok(Vec::new())
    }
}
