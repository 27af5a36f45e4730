// src/monitoring/report.rs
//! Plain-text rendering of snapshots for terminals

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::analytics::{NetworkSnapshot, Severity};
use crate::source::SignatureRecord;

/// Width of the share bar in the program table
const BAR_WIDTH: usize = 20;

/// Render a snapshot as a multi-section text report
pub fn render_snapshot(snapshot: &NetworkSnapshot) -> String {
    let mut out = String::new();
    let stats = &snapshot.stats;
    let summary = &snapshot.block_summary;

    let _ = writeln!(out, "=== Solana network snapshot @ {} ===", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Slot          {}", stats.slot);
    let _ = writeln!(out, "Block height  {}", stats.block_height);
    let _ = writeln!(
        out,
        "Epoch         {} ({:.1}%, slot {} of {})",
        stats.epoch.epoch,
        stats.epoch.progress_percent(),
        stats.epoch.slot_index,
        stats.epoch.slots_in_epoch
    );
    if let Some(count) = stats.epoch.transaction_count {
        let _ = writeln!(out, "Lifetime txs  {}", count);
    }
    let _ = writeln!(out, "TPS           {:.0}", stats.tps);
    let _ = writeln!(out, "Validators    {}", stats.validator_count);

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Blocks ---");
    let _ = writeln!(out, "Analyzed      {}", summary.blocks_analyzed);
    let _ = writeln!(out, "Transactions  {}", summary.total_transactions);
    let _ = writeln!(out, "Success rate  {:.1}%", summary.success_rate);
    let _ = writeln!(out, "Avg tx/block  {:.1}", summary.avg_tx_per_block);

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Top programs ---");
    if snapshot.top_programs.is_empty() {
        let _ = writeln!(out, "(no invocations in window)");
    }
    for (rank, program) in snapshot.top_programs.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<28} {:<8} {:>7} {:>5.1}% {}",
            rank + 1,
            program.label,
            program.category.to_string(),
            program.invocations,
            program.share,
            share_bar(program.share)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Anomalies ---");
    if snapshot.anomalies.is_empty() {
        let _ = writeln!(out, "none");
    }
    for anomaly in &snapshot.anomalies {
        let _ = writeln!(
            out,
            "{} [{}] {}: {}",
            severity_marker(anomaly.severity),
            anomaly.severity,
            anomaly.kind,
            anomaly.message
        );
    }

    out
}

/// Render an identifier's transaction history
pub fn render_history(identifier: &str, records: &[SignatureRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Recent transactions for {} ===", identifier);
    if records.is_empty() {
        let _ = writeln!(out, "(none)");
        return out;
    }

    for record in records {
        let time = record
            .block_time
            .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if record.succeeded { "ok" } else { "FAILED" };

        let _ = write!(out, "{:>12}  {:<19}  {:<6}  {}", record.slot, time, status, record.signature);
        if let Some(memo) = &record.memo {
            let _ = write!(out, "  memo: {}", memo);
        }
        let _ = writeln!(out);
    }

    out
}

fn share_bar(share: f64) -> String {
    let filled = ((share / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    "#".repeat(filled)
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "·",
        Severity::Medium => "!",
        Severity::High => "!!",
    }
}
