//! Best-attempt ranking over the stored score history.
//!
//! Records rank by `(percent, score, timestamp_utc)`: higher percent first,
//! then higher raw score, then the most recent attempt.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::record::ScoreRecord;

pub fn ranking_cmp(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    a.percent
        .total_cmp(&b.percent)
        .then(a.score.cmp(&b.score))
        .then(a.timestamp_utc.cmp(&b.timestamp_utc))
}

/// One record per distinct trimmed, non-empty learner name: the best-ranked one.
pub fn best_attempt_per_learner(records: &[ScoreRecord]) -> BTreeMap<String, ScoreRecord> {
    records
        .iter()
        .filter_map(|r| {
            let name = r.learner_name.trim();
            (!name.is_empty()).then(|| (name.to_string(), r))
        })
        .into_grouping_map()
        .max_by(|_, a, b| ranking_cmp(a, b))
        .into_iter()
        .map(|(name, record)| (name, record.clone()))
        .collect()
}

/// Best attempts, best first.
pub fn top_n(records: &[ScoreRecord], n: usize) -> Vec<ScoreRecord> {
    best_attempt_per_learner(records)
        .into_values()
        .sorted_by(|a, b| ranking_cmp(b, a))
        .take(n)
        .collect()
}

/// Best attempts, worst first.
pub fn bottom_n(records: &[ScoreRecord], n: usize) -> Vec<ScoreRecord> {
    best_attempt_per_learner(records)
        .into_values()
        .sorted_by(ranking_cmp)
        .take(n)
        .collect()
}

/// Raw history, newest first. Not deduplicated, blank names included.
pub fn recent(records: &[ScoreRecord], n: usize) -> Vec<ScoreRecord> {
    records
        .iter()
        .sorted_by(|a, b| b.timestamp_utc.cmp(&a.timestamp_utc))
        .take(n)
        .cloned()
        .collect()
}

/// Podium marker for a 1-based ranking position.
pub fn medal(position: usize) -> &'static str {
    match position {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🏅",
    }
}
