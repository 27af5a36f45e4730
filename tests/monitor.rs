//! Poll-loop tests against a scripted ledger source

mod common;

use std::time::Duration;

use common::{Failure, Round, ScriptedSource};
use solana_pulse::{AnalyticsEngine, MonitorConfig, MonitorEvent, SnapshotMonitor};
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut tokio::sync::mpsc::Receiver<MonitorEvent>) -> MonitorEvent {
    timeout(WAIT, events.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_monitor_publishes_snapshots() {
    let source = ScriptedSource::new(Round::new(100.0));
    let engine = AnalyticsEngine::new(source.clone());
    let (monitor, mut events) = SnapshotMonitor::start_with_interval(engine, TICK, 5, 4);
    assert!(monitor.is_running());

    for _ in 0..3 {
        match next_event(&mut events).await {
            MonitorEvent::Snapshot(snapshot) => assert_eq!(snapshot.stats.tps, 100.0),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    let engine = monitor.stop().await.unwrap();
    assert!(engine.history().len() >= 3);
    assert_eq!(engine.baseline_tps(), Some(100.0));
}

#[tokio::test]
async fn test_monitor_survives_failed_ticks() {
    let source = ScriptedSource::new(Round::new(100.0));
    source.fail(Some(Failure::Blocks));
    let engine = AnalyticsEngine::new(source.clone());
    let (monitor, mut events) = SnapshotMonitor::start_with_interval(engine, TICK, 5, 4);

    match next_event(&mut events).await {
        MonitorEvent::Failed { error, retryable } => {
            assert!(retryable);
            assert!(error.contains("Node is unhealthy"), "{}", error);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    source.fail(None);
    let recovered = loop {
        if let MonitorEvent::Snapshot(snapshot) = next_event(&mut events).await {
            break snapshot;
        }
    };
    assert_eq!(recovered.block_summary.blocks_analyzed, 1);

    let engine = monitor.stop().await.unwrap();
    assert!(!engine.history().is_empty());
}

#[tokio::test]
async fn test_monitor_stops_when_receiver_dropped() {
    let source = ScriptedSource::new(Round::new(100.0));
    let engine = AnalyticsEngine::new(source.clone());
    let (monitor, events) = SnapshotMonitor::start_with_interval(engine, TICK, 5, 1);
    drop(events);

    timeout(WAIT, async {
        while monitor.is_running() {
            tokio::time::sleep(TICK).await;
        }
    })
    .await
    .unwrap();

    // The engine is still handed back after the loop exited on its own
    assert!(monitor.stop().await.is_some());
}

#[tokio::test]
async fn test_monitor_stop_before_first_event() {
    let source = ScriptedSource::new(Round::new(100.0));
    let engine = AnalyticsEngine::new(source.clone());
    let config = MonitorConfig { interval_secs: 3600, block_window: 5, channel_capacity: 1 };
    let (monitor, _events) = SnapshotMonitor::start(engine, config);

    let engine = timeout(WAIT, monitor.stop()).await.unwrap().unwrap();
    assert!(engine.history().len() <= 1);
}
