// src/analytics/anomaly.rs
//! Anomaly Rule Set
//!
//! A fixed, ordered battery of independent rules. Each rule looks at the
//! current round's data together with the engine's baseline and history (as
//! they were before this round) and emits zero or more anomalies. Rules
//! never short-circuit each other.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::aggregator::BlockSummary;
use super::history::HistoryRing;
use super::ranking::ProgramRanking;
use crate::labels::resolve_label;
use crate::source::{InvocationCounts, NetworkStats};

/// Success rate (percent) below which failures are flagged
const FAILURE_RATE_THRESHOLD: f64 = 80.0;

/// Success rate (percent) below which failures are high severity
const FAILURE_RATE_HIGH: f64 = 50.0;

/// Minimum sample size for the failure rule
const FAILURE_MIN_TRANSACTIONS: u64 = 10;

const TPS_SPIKE_RATIO: f64 = 2.0;
const TPS_SPIKE_HIGH_RATIO: f64 = 3.0;
const TPS_DROP_RATIO: f64 = 0.3;
const TPS_DROP_HIGH_RATIO: f64 = 0.1;

const LARGE_BLOCK_TX: f64 = 2000.0;
const LARGE_BLOCK_HIGH_TX: f64 = 5000.0;
const EMPTY_BLOCK_TX: f64 = 5.0;

/// History entries scanned for previously seen programs
const NEW_PROGRAM_LOOKBACK: usize = 5;

/// History length required before new programs are flagged
const NEW_PROGRAM_MIN_HISTORY: usize = 3;

/// History length required before surges are flagged
const SURGE_MIN_HISTORY: usize = 2;

/// Previous count a program must exceed to be considered for a surge
const SURGE_MIN_PREVIOUS: u64 = 5;

const SURGE_RATIO: u64 = 3;
const SURGE_HIGH_RATIO: u64 = 10;

/// Anomaly kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    HighFailureRate,
    TpsSpike,
    TpsDrop,
    LargeBlock,
    EmptyBlock,
    NewProgramDetected,
    ProgramSurge,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::HighFailureRate => write!(f, "high_failure_rate"),
            AnomalyKind::TpsSpike => write!(f, "tps_spike"),
            AnomalyKind::TpsDrop => write!(f, "tps_drop"),
            AnomalyKind::LargeBlock => write!(f, "large_block"),
            AnomalyKind::EmptyBlock => write!(f, "empty_block"),
            AnomalyKind::NewProgramDetected => write!(f, "new_program_detected"),
            AnomalyKind::ProgramSurge => write!(f, "program_surge"),
        }
    }
}

/// Anomaly severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// A flagged condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Kind
    pub kind: AnomalyKind,

    /// Severity
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Values that triggered the anomaly
    pub data: serde_json::Value,

    /// Detection time
    pub timestamp: DateTime<Utc>,
}

/// Everything a rule may look at
pub struct RuleContext<'a> {
    /// Freshly fetched network statistics
    pub stats: &'a NetworkStats,

    /// Freshly computed block summary
    pub summary: &'a BlockSummary,

    /// Freshly computed rankings
    pub rankings: &'a [ProgramRanking],

    /// This round's invocation counts
    pub counts: &'a InvocationCounts,

    /// Baseline TPS before this round
    pub baseline: Option<f64>,

    /// History before this round
    pub history: &'a HistoryRing,

    /// Programs observed in any earlier round
    pub known_programs: &'a HashSet<String>,

    /// Snapshot timestamp
    pub timestamp: DateTime<Utc>,
}

impl RuleContext<'_> {
    fn anomaly(
        &self,
        kind: AnomalyKind,
        severity: Severity,
        message: String,
        data: serde_json::Value,
    ) -> Anomaly {
        Anomaly { kind, severity, message, data, timestamp: self.timestamp }
    }
}

/// A single rule
pub type RuleFn = fn(&RuleContext<'_>) -> Vec<Anomaly>;

/// The rule battery, in evaluation order
pub const RULES: &[RuleFn] = &[
    high_failure_rate,
    tps_deviation,
    large_block,
    empty_block,
    new_program_detected,
    program_surge,
];

/// Run every rule in order and concatenate their output
pub fn evaluate(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    RULES.iter().flat_map(|rule| rule(ctx)).collect()
}

fn high_failure_rate(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    let summary = ctx.summary;
    if summary.success_rate >= FAILURE_RATE_THRESHOLD
        || summary.total_transactions <= FAILURE_MIN_TRANSACTIONS
    {
        return Vec::new();
    }

    let severity =
        if summary.success_rate < FAILURE_RATE_HIGH { Severity::High } else { Severity::Medium };

    vec![ctx.anomaly(
        AnomalyKind::HighFailureRate,
        severity,
        format!(
            "Transaction success rate is {:.1}% across {} transactions",
            summary.success_rate, summary.total_transactions
        ),
        json!({
            "success_rate": summary.success_rate,
            "total_transactions": summary.total_transactions,
        }),
    )]
}

/// TPS spike or drop relative to the baseline; at most one per round
fn tps_deviation(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    let baseline = match ctx.baseline {
        Some(baseline) if baseline > 0.0 => baseline,
        _ => return Vec::new(),
    };

    let current = ctx.stats.tps;
    let ratio = current / baseline;
    let data = json!({
        "current_tps": current,
        "baseline_tps": baseline,
        "ratio": ratio,
    });

    if ratio > TPS_SPIKE_RATIO {
        let severity = if ratio > TPS_SPIKE_HIGH_RATIO { Severity::High } else { Severity::Medium };
        vec![ctx.anomaly(
            AnomalyKind::TpsSpike,
            severity,
            format!("TPS spiked to {:.0} ({:.1}x baseline of {:.0})", current, ratio, baseline),
            data,
        )]
    } else if ratio < TPS_DROP_RATIO && current > 0.0 {
        let severity = if ratio < TPS_DROP_HIGH_RATIO { Severity::High } else { Severity::Medium };
        vec![ctx.anomaly(
            AnomalyKind::TpsDrop,
            severity,
            format!(
                "TPS dropped to {:.0} ({:.0}% of baseline {:.0})",
                current,
                ratio * 100.0,
                baseline
            ),
            data,
        )]
    } else {
        Vec::new()
    }
}

fn large_block(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    let avg = ctx.summary.avg_tx_per_block;
    if avg <= LARGE_BLOCK_TX {
        return Vec::new();
    }

    let severity = if avg > LARGE_BLOCK_HIGH_TX { Severity::High } else { Severity::Low };
    vec![ctx.anomaly(
        AnomalyKind::LargeBlock,
        severity,
        format!("Blocks average {:.0} transactions", avg),
        json!({
            "avg_tx_per_block": avg,
            "blocks_analyzed": ctx.summary.blocks_analyzed,
        }),
    )]
}

fn empty_block(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    let summary = ctx.summary;
    if summary.blocks_analyzed == 0 || summary.avg_tx_per_block >= EMPTY_BLOCK_TX {
        return Vec::new();
    }

    vec![ctx.anomaly(
        AnomalyKind::EmptyBlock,
        Severity::Medium,
        format!(
            "Blocks are nearly empty: {:.1} transactions on average over {} blocks",
            summary.avg_tx_per_block, summary.blocks_analyzed
        ),
        json!({
            "avg_tx_per_block": summary.avg_tx_per_block,
            "blocks_analyzed": summary.blocks_analyzed,
        }),
    )]
}

fn new_program_detected(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    if ctx.history.len() <= NEW_PROGRAM_MIN_HISTORY {
        return Vec::new();
    }

    let recently_seen: BTreeSet<&str> = ctx
        .history
        .recent(NEW_PROGRAM_LOOKBACK)
        .flat_map(|point| point.program_counts.keys().map(String::as_str))
        .collect();

    ctx.counts
        .iter()
        .filter(|(id, _)| !recently_seen.contains(id.as_str()) && !ctx.known_programs.contains(*id))
        .map(|(id, count)| {
            let label = resolve_label(id);
            ctx.anomaly(
                AnomalyKind::NewProgramDetected,
                Severity::Low,
                format!("New program active: {} ({} invocations)", label.label, count),
                json!({
                    "program_id": id,
                    "label": label.label,
                    "invocations": count,
                }),
            )
        })
        .collect()
}

fn program_surge(ctx: &RuleContext<'_>) -> Vec<Anomaly> {
    if ctx.history.len() <= SURGE_MIN_HISTORY {
        return Vec::new();
    }
    let previous = match ctx.history.latest() {
        Some(point) => &point.program_counts,
        None => return Vec::new(),
    };

    ctx.counts
        .iter()
        .filter_map(|(id, count)| {
            let prev = previous.get(id).copied().unwrap_or(0);
            if prev <= SURGE_MIN_PREVIOUS || *count <= prev.saturating_mul(SURGE_RATIO) {
                return None;
            }

            let severity = if *count > prev.saturating_mul(SURGE_HIGH_RATIO) {
                Severity::High
            } else {
                Severity::Medium
            };
            let label = resolve_label(id);
            Some(ctx.anomaly(
                AnomalyKind::ProgramSurge,
                severity,
                format!(
                    "{} invocations surged from {} to {} ({:.1}x)",
                    label.label,
                    prev,
                    count,
                    *count as f64 / prev as f64
                ),
                json!({
                    "program_id": id,
                    "label": label.label,
                    "previous": prev,
                    "current": count,
                }),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::history::HistoricalDataPoint;
    use crate::source::EpochProgress;

    fn stats(tps: f64) -> NetworkStats {
        NetworkStats {
            slot: 1000,
            block_height: 900,
            epoch: EpochProgress {
                epoch: 1,
                slot_index: 10,
                slots_in_epoch: 100,
                absolute_slot: 1000,
                transaction_count: None,
            },
            tps,
            validator_count: 10,
        }
    }

    fn summary(success_rate: f64, total: u64, avg: f64, blocks: usize) -> BlockSummary {
        BlockSummary {
            blocks_analyzed: blocks,
            total_transactions: total,
            success_rate,
            avg_tx_per_block: avg,
            avg_fee_per_tx: 0.0,
        }
    }

    fn counts(entries: &[(&str, u64)]) -> InvocationCounts {
        entries.iter().map(|(id, c)| (id.to_string(), *c)).collect()
    }

    fn history_of(rounds: &[InvocationCounts]) -> HistoryRing {
        let mut ring = HistoryRing::default();
        for round in rounds {
            ring.push(HistoricalDataPoint {
                timestamp: Utc::now(),
                tps: 100.0,
                total_transactions: 100,
                success_rate: 100.0,
                program_counts: round.clone(),
            });
        }
        ring
    }

    /// Owned inputs for building a `RuleContext`
    struct Fixture {
        stats: NetworkStats,
        summary: BlockSummary,
        counts: InvocationCounts,
        baseline: Option<f64>,
        history: HistoryRing,
        known: HashSet<String>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                stats: stats(100.0),
                summary: summary(100.0, 100, 100.0, 1),
                counts: InvocationCounts::new(),
                baseline: None,
                history: HistoryRing::default(),
                known: HashSet::new(),
            }
        }

        fn run(&self, rule: RuleFn) -> Vec<Anomaly> {
            rule(&RuleContext {
                stats: &self.stats,
                summary: &self.summary,
                rankings: &[],
                counts: &self.counts,
                baseline: self.baseline,
                history: &self.history,
                known_programs: &self.known,
                timestamp: Utc::now(),
            })
        }
    }

    #[test]
    fn test_high_failure_rate() {
        let mut fx = Fixture::new();
        fx.summary = summary(40.0, 50, 10.0, 5);
        let found = fx.run(high_failure_rate);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::HighFailureRate);
        assert_eq!(found[0].severity, Severity::High);

        fx.summary = summary(70.0, 50, 10.0, 5);
        assert_eq!(fx.run(high_failure_rate)[0].severity, Severity::Medium);
    }

    #[test]
    fn test_high_failure_rate_ignores_small_samples() {
        let mut fx = Fixture::new();
        fx.summary = summary(40.0, 5, 5.0, 1);
        assert!(fx.run(high_failure_rate).is_empty());

        fx.summary = summary(40.0, 10, 10.0, 1);
        assert!(fx.run(high_failure_rate).is_empty());
    }

    #[test]
    fn test_tps_spike() {
        let mut fx = Fixture::new();
        fx.baseline = Some(100.0);

        fx.stats = stats(250.0);
        let found = fx.run(tps_deviation);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::TpsSpike);
        assert_eq!(found[0].severity, Severity::Medium);

        fx.stats = stats(350.0);
        assert_eq!(fx.run(tps_deviation)[0].severity, Severity::High);

        fx.stats = stats(150.0);
        assert!(fx.run(tps_deviation).is_empty());
    }

    #[test]
    fn test_tps_drop() {
        let mut fx = Fixture::new();
        fx.baseline = Some(100.0);

        fx.stats = stats(20.0);
        let found = fx.run(tps_deviation);
        assert_eq!(found[0].kind, AnomalyKind::TpsDrop);
        assert_eq!(found[0].severity, Severity::Medium);

        fx.stats = stats(5.0);
        assert_eq!(fx.run(tps_deviation)[0].severity, Severity::High);

        // Zero TPS is treated as missing data, not a drop
        fx.stats = stats(0.0);
        assert!(fx.run(tps_deviation).is_empty());
    }

    #[test]
    fn test_tps_rules_need_a_positive_baseline() {
        let mut fx = Fixture::new();
        fx.stats = stats(10_000.0);
        assert!(fx.run(tps_deviation).is_empty());

        fx.baseline = Some(0.0);
        assert!(fx.run(tps_deviation).is_empty());
    }

    #[test]
    fn test_block_size_rules() {
        let mut fx = Fixture::new();

        fx.summary = summary(100.0, 3000, 3000.0, 1);
        let found = fx.run(large_block);
        assert_eq!(found[0].severity, Severity::Low);

        fx.summary = summary(100.0, 6000, 6000.0, 1);
        assert_eq!(fx.run(large_block)[0].severity, Severity::High);

        fx.summary = summary(100.0, 3, 3.0, 1);
        let found = fx.run(empty_block);
        assert_eq!(found[0].kind, AnomalyKind::EmptyBlock);
        assert_eq!(found[0].severity, Severity::Medium);

        fx.summary = BlockSummary::default();
        assert!(fx.run(empty_block).is_empty());
    }

    #[test]
    fn test_new_program_needs_history() {
        let mut fx = Fixture::new();
        fx.counts = counts(&[("fresh", 3)]);
        fx.history = history_of(&[counts(&[("a", 1)]), counts(&[("a", 1)]), counts(&[("a", 1)])]);
        assert!(fx.run(new_program_detected).is_empty());

        fx.history.push(HistoricalDataPoint {
            timestamp: Utc::now(),
            tps: 1.0,
            total_transactions: 1,
            success_rate: 100.0,
            program_counts: counts(&[("a", 1)]),
        });
        let found = fx.run(new_program_detected);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Low);
        assert_eq!(found[0].data["program_id"], "fresh");
    }

    #[test]
    fn test_new_program_respects_known_set() {
        let mut fx = Fixture::new();
        fx.history = history_of(&vec![counts(&[("a", 1)]); 6]);
        fx.counts = counts(&[("a", 1), ("returning", 4), ("zzz", 1), ("brand-new", 2)]);
        fx.known = ["a", "returning"].iter().map(|s| s.to_string()).collect();

        let ids: Vec<String> = fx
            .run(new_program_detected)
            .iter()
            .map(|a| a.data["program_id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["brand-new".to_string(), "zzz".to_string()]);
    }

    #[test]
    fn test_program_surge() {
        let mut fx = Fixture::new();
        fx.history = history_of(&[
            counts(&[("x", 1)]),
            counts(&[("x", 1)]),
            counts(&[("x", 10), ("small", 5)]),
        ]);
        fx.counts = counts(&[("x", 35), ("small", 500)]);

        let found = fx.run(program_surge);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::ProgramSurge);
        assert_eq!(found[0].severity, Severity::Medium);
        assert_eq!(found[0].data["previous"], 10);

        fx.counts = counts(&[("x", 101)]);
        assert_eq!(fx.run(program_surge)[0].severity, Severity::High);

        fx.counts = counts(&[("x", 30)]);
        assert!(fx.run(program_surge).is_empty());
    }

    #[test]
    fn test_program_surge_with_extreme_counts() {
        let mut fx = Fixture::new();
        fx.history = history_of(&[
            counts(&[("x", 1)]),
            counts(&[("x", 1)]),
            counts(&[("x", u64::MAX / 2), ("y", 6)]),
        ]);
        fx.counts = counts(&[("x", u64::MAX), ("y", u64::MAX)]);

        // x cannot exceed a saturated threshold; y still surges
        let found = fx.run(program_surge);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data["program_id"], "y");
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn test_program_surge_needs_history() {
        let mut fx = Fixture::new();
        fx.history = history_of(&[counts(&[("x", 1)]), counts(&[("x", 10)])]);
        fx.counts = counts(&[("x", 1000)]);
        assert!(fx.run(program_surge).is_empty());
    }

    #[test]
    fn test_evaluate_runs_rules_in_order() {
        let mut fx = Fixture::new();
        fx.summary = summary(40.0, 20, 4.0, 5);
        fx.baseline = Some(100.0);
        fx.stats = stats(400.0);

        let ctx = RuleContext {
            stats: &fx.stats,
            summary: &fx.summary,
            rankings: &[],
            counts: &fx.counts,
            baseline: fx.baseline,
            history: &fx.history,
            known_programs: &fx.known,
            timestamp: Utc::now(),
        };
        let kinds: Vec<AnomalyKind> = evaluate(&ctx).iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AnomalyKind::HighFailureRate, AnomalyKind::TpsSpike, AnomalyKind::EmptyBlock]
        );
    }

    #[test]
    fn test_rule_battery() {
        assert_eq!(RULES.len(), 6);

        // An all-quiet round triggers nothing
        let fx = Fixture::new();
        for rule in RULES {
            assert!(fx.run(*rule).is_empty());
        }
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_value(AnomalyKind::NewProgramDetected).unwrap(), "new_program_detected");
        assert_eq!(serde_json::to_value(Severity::Medium).unwrap(), "medium");
        assert_eq!(AnomalyKind::TpsDrop.to_string(), "tps_drop");
    }
}
