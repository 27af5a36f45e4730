// src/monitoring/mod.rs
//! Monitoring Module for solana-pulse
//!
//! This module drives an analytics engine on a fixed wall-clock interval:
//! - One `take_snapshot` per tick, never overlapping
//! - Every outcome (snapshot or failure) published on a channel
//! - Failed ticks are logged and retried on the next tick
//! - Shutdown through a dedicated channel, handing the engine back
//!
//! Rendering of snapshots for the terminal lives in `report`.

pub mod report;

use std::time::Duration;

use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::analytics::{AnalyticsEngine, NetworkSnapshot, DEFAULT_BLOCK_WINDOW};
use crate::source::LedgerDataSource;

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval between snapshots in seconds
    pub interval_secs: u64,

    /// Blocks sampled per snapshot
    pub block_window: usize,

    /// Capacity of the event channel
    pub channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            block_window: DEFAULT_BLOCK_WINDOW,
            channel_capacity: 16,
        }
    }
}

impl MonitorConfig {
    /// Tick interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Outcome of one monitor tick
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A snapshot was taken
    Snapshot(Box<NetworkSnapshot>),

    /// The snapshot failed; the monitor keeps running
    Failed {
        /// Error description
        error: String,

        /// Whether the next tick may succeed
        retryable: bool,
    },
}

/// Poll loop owning one analytics engine
pub struct SnapshotMonitor<S> {
    /// Shutdown channel
    shutdown_tx: Option<mpsc::Sender<()>>,

    /// Polling task, yields the engine back on exit
    task: Option<JoinHandle<AnalyticsEngine<S>>>,
}

impl<S: LedgerDataSource + 'static> SnapshotMonitor<S> {
    /// Start polling with a tick every `config.interval_secs` seconds
    pub fn start(
        engine: AnalyticsEngine<S>,
        config: MonitorConfig,
    ) -> (Self, mpsc::Receiver<MonitorEvent>) {
        Self::start_with_interval(engine, config.interval(), config.block_window, config.channel_capacity)
    }

    /// Start polling with an explicit tick interval
    pub fn start_with_interval(
        mut engine: AnalyticsEngine<S>,
        interval: Duration,
        block_window: usize,
        channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<MonitorEvent>) {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (events_tx, events_rx) = mpsc::channel::<MonitorEvent>(channel_capacity.max(1));

        let task = tokio::spawn(async move {
            let mut timer = time::interval(interval);
            // A slow snapshot delays the next tick instead of bunching ticks up
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let event = match engine.take_snapshot(block_window).await {
                            Ok(snapshot) => MonitorEvent::Snapshot(Box::new(snapshot)),
                            Err(e) => {
                                error!("Snapshot failed: {}", e);
                                MonitorEvent::Failed { error: e.to_string(), retryable: e.is_retryable() }
                            }
                        };

                        tokio::select! {
                            sent = events_tx.send(event) => {
                                if sent.is_err() {
                                    info!("Snapshot receiver dropped, stopping monitor");
                                    break;
                                }
                            }
                            _ = shutdown_rx.recv() => break,
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        // Shutdown requested
                        break;
                    }
                }
            }

            engine
        });

        let monitor = Self { shutdown_tx: Some(shutdown_tx), task: Some(task) };
        (monitor, events_rx)
    }

    /// Check if the polling task is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Stop polling and hand the engine back
    pub async fn stop(mut self) -> Option<AnalyticsEngine<S>> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        let task = self.task.take()?;
        match task.await {
            Ok(engine) => Some(engine),
            Err(e) => {
                error!("Monitor task failed: {}", e);
                None
            }
        }
    }
}
