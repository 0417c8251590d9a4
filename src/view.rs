//! What the front end shows. Plain data, built from session and store state.

use crate::justification::{options_for, JustificationOption};
use crate::leaderboard::{self, medal};
use crate::record::{format_timestamp, ScoreRecord};
use crate::rules::{Verdict, ViolationReason};
use crate::session::{Completion, Outcome, QuestionOrder, Session};

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub identifier: String,
    /// 1-based
    pub position: usize,
    pub total: usize,
    pub score: u32,
    pub progress: f64,
    pub revealed: bool,
}

impl QuestionView {
    pub const CHOICES: [Verdict; 3] = Verdict::CHOICES;

    pub fn from_session<O: QuestionOrder>(session: &Session<O>) -> Option<Self> {
        let identifier = session.current_identifier()?.to_string();
        let total = session.total();
        Some(Self {
            identifier,
            position: session.index() + 1,
            total,
            score: session.score(),
            progress: session.index() as f64 / total as f64,
            revealed: session.is_revealed(),
        })
    }

    /// Justification list to show once `choice` is selected.
    pub fn options(choice: Verdict) -> &'static [JustificationOption] {
        options_for(choice)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackView {
    pub correct: bool,
    pub expected: Verdict,
    /// Human labels of the hard reasons, in fixed order.
    pub reason_labels: Vec<String>,
    pub note: Option<&'static str>,
    /// Learner answered Invalid but none of their reasons applied.
    pub justification_warning: bool,
}

impl From<&Outcome> for FeedbackView {
    fn from(outcome: &Outcome) -> Self {
        let expected = outcome.expected.verdict;
        let reason_labels = ViolationReason::HARD
            .iter()
            .filter(|r| outcome.expected.reasons.contains(r))
            .map(ToString::to_string)
            .collect();
        let note = match expected {
            Verdict::Valid => Some("Valid and well-structured identifier."),
            Verdict::ValidButPoorPractice => {
                Some("Valid, but poor practice (usually not descriptive enough).")
            }
            Verdict::Invalid if outcome.expected.reasons.contains(&ViolationReason::EmptyName) => {
                Some("An identifier cannot be empty.")
            }
            Verdict::Invalid => None,
        };
        Self {
            correct: outcome.correct,
            expected,
            reason_labels,
            note,
            justification_warning: outcome.chosen == Verdict::Invalid
                && outcome.justification_matched == Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionView {
    pub learner_name: String,
    pub score: u32,
    pub total: u32,
    pub percent: f64,
    pub warning: Option<String>,
}

impl CompletionView {
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

impl From<&Completion> for CompletionView {
    fn from(c: &Completion) -> Self {
        Self {
            learner_name: c.learner_name.clone(),
            score: c.score,
            total: c.total,
            percent: c.percent,
            warning: c.save_warning.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub position: usize,
    pub medal: Option<&'static str>,
    pub learner_name: String,
    pub points: String,
    pub percent: String,
    pub timestamp_utc: String,
}

impl LeaderboardRow {
    fn new(position: usize, medal: Option<&'static str>, record: &ScoreRecord) -> Self {
        Self {
            position,
            medal,
            learner_name: record.learner_name.clone(),
            points: record.score_label(),
            percent: record.percent_label(),
            timestamp_utc: format_timestamp(&record.timestamp_utc),
        }
    }
}

/// Instructor dashboard: ranking with medals, bottom table, raw recent history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dashboard {
    pub ranking: Vec<LeaderboardRow>,
    pub bottom: Vec<LeaderboardRow>,
    pub recent: Vec<ScoreRecord>,
}

impl Dashboard {
    pub fn build(records: &[ScoreRecord], leaderboard_size: usize, recent_size: usize) -> Self {
        let ranking = leaderboard::top_n(records, leaderboard_size)
            .iter()
            .enumerate()
            .map(|(i, r)| LeaderboardRow::new(i + 1, Some(medal(i + 1)), r))
            .collect();
        let bottom = leaderboard::bottom_n(records, leaderboard_size)
            .iter()
            .enumerate()
            .map(|(i, r)| LeaderboardRow::new(i + 1, None, r))
            .collect();
        Self {
            ranking,
            bottom,
            recent: leaderboard::recent(records, recent_size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
