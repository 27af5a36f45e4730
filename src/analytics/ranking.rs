// src/analytics/ranking.rs
//! Ranking Function
//!
//! Turns an invocation-count map into a share-weighted top-N list annotated
//! with labels from the directory.

use serde::{Deserialize, Serialize};

use crate::labels::{resolve_label, ProgramCategory};
use crate::source::InvocationCounts;

/// Default number of ranked programs
pub const DEFAULT_RANKING_LIMIT: usize = 20;

/// One ranked program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRanking {
    /// Program identifier
    pub program_id: String,

    /// Display label
    pub label: String,

    /// Category
    pub category: ProgramCategory,

    /// Invocations in the window
    pub invocations: u64,

    /// Percentage of all invocations in the window
    pub share: f64,
}

/// Rank programs by invocation count, descending.
///
/// Equal counts keep identifier order (the map's iteration order, ascending)
/// because the sort is stable. Shares are computed against the full map
/// before truncation to `limit`.
pub fn rank_programs(counts: &InvocationCounts, limit: usize) -> Vec<ProgramRanking> {
    let total = counts.values().fold(0u64, |acc, count| acc.saturating_add(*count));

    let mut entries: Vec<(&String, u64)> = counts.iter().map(|(id, count)| (id, *count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .into_iter()
        .take(limit)
        .map(|(program_id, invocations)| {
            let resolved = resolve_label(program_id);
            ProgramRanking {
                program_id: program_id.clone(),
                label: resolved.label.into_owned(),
                category: resolved.category,
                invocations,
                share: if total > 0 { invocations as f64 / total as f64 * 100.0 } else { 0.0 },
            }
        })
        .collect()
}
