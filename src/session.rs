//! One learner's play-through.
//!
//! `AwaitingName -> InProgress -> Completed`. Completion is detected by
//! comparing the question index with the total, never by a separate flag.
//! Each question goes through a strict submit-then-advance cycle: once an
//! answer is revealed it cannot be resubmitted, and the next question is only
//! reachable through `advance`.

use std::collections::BTreeSet;

use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::bank::QuestionBank;
use crate::error::{QuizError, Result};
use crate::justification::{self, JustificationOption};
use crate::record::{percent_of, ScoreRecord};
use crate::rules::{Assessment, RuleSet, Verdict};
use crate::store::ScoreStore;

/// Source of the question order for a play-through
pub trait QuestionOrder {
    fn arrange(&mut self, identifiers: &mut [String]);
}

/// Uniform shuffle from any `rand` generator
#[derive(Debug, Clone)]
pub struct RandomOrder<R: Rng> {
    rng: R,
}

impl RandomOrder<ThreadRng> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl RandomOrder<StdRng> {
    /// Reproducible order, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> QuestionOrder for RandomOrder<R> {
    fn arrange(&mut self, identifiers: &mut [String]) {
        identifiers.shuffle(&mut self.rng);
    }
}

/// Keeps the bank order untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrder;

impl QuestionOrder for FixedOrder {
    fn arrange(&mut self, _identifiers: &mut [String]) {}
}

impl<O: QuestionOrder + ?Sized> QuestionOrder for Box<O> {
    fn arrange(&mut self, identifiers: &mut [String]) {
        (**self).arrange(identifiers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[strum(to_string = "awaiting a learner name")]
    AwaitingName,
    #[strum(to_string = "in progress")]
    InProgress,
    #[strum(to_string = "completed")]
    Completed,
}

/// Result of one submitted answer, kept until `advance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub identifier: String,
    pub chosen: Verdict,
    pub correct: bool,
    pub expected: Assessment,
    pub selected: BTreeSet<JustificationOption>,
    /// `Some` only when the identifier is invalid. Advisory, never scored.
    pub justification_matched: Option<bool>,
}

/// Summary shown once the last question has been advanced past.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub learner_name: String,
    pub score: u32,
    pub total: u32,
    pub percent: f64,
    /// Set when the record could not be persisted; the result still stands.
    pub save_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Next,
    Completed(Completion),
}

#[derive(Debug)]
pub struct Session<O: QuestionOrder> {
    bank: QuestionBank,
    rules: RuleSet,
    order_source: O,
    min_name_len: usize,
    learner: Option<String>,
    order: Vec<String>,
    index: usize,
    score: u32,
    revealed: bool,
    last_outcome: Option<Outcome>,
    saved_once: bool,
    completion: Option<Completion>,
}

pub const DEFAULT_MIN_NAME_LEN: usize = 3;

impl<O: QuestionOrder> Session<O> {
    /// A session waiting for the learner to identify themselves.
    pub fn new(bank: QuestionBank, rules: RuleSet, order_source: O) -> Self {
        Self {
            bank,
            rules,
            order_source,
            min_name_len: DEFAULT_MIN_NAME_LEN,
            learner: None,
            order: Vec::new(),
            index: 0,
            score: 0,
            revealed: false,
            last_outcome: None,
            saved_once: false,
            completion: None,
        }
    }

    /// A session with no name gate: starts directly in progress under an empty name.
    pub fn without_name_gate(bank: QuestionBank, rules: RuleSet, order_source: O) -> Self {
        let mut session = Self::new(bank, rules, order_source);
        session.learner = Some(String::new());
        session.reset_progress();
        session
    }

    pub fn with_min_name_len(mut self, min_name_len: usize) -> Self {
        self.min_name_len = min_name_len;
        self
    }

    pub fn phase(&self) -> Phase {
        match self.learner {
            None => Phase::AwaitingName,
            Some(_) if self.index >= self.order.len() => Phase::Completed,
            Some(_) => Phase::InProgress,
        }
    }

    pub fn learner(&self) -> Option<&str> {
        self.learner.as_deref()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn percent(&self) -> f64 {
        percent_of(self.score, self.total() as u32)
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    pub fn saved_once(&self) -> bool {
        self.saved_once
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn current_identifier(&self) -> Option<&str> {
        match self.phase() {
            Phase::InProgress => self.order.get(self.index).map(String::as_str),
            _ => None,
        }
    }

    /// Answer key for the current question, computed on demand.
    pub fn current_assessment(&self) -> Option<Assessment> {
        self.current_identifier().map(|id| self.rules.assess(id))
    }

    pub fn start(&mut self, learner_name: &str) -> Result<()> {
        self.require(Phase::AwaitingName, "start a session")?;

        let name = learner_name.trim();
        if name.chars().count() < self.min_name_len {
            return Err(QuizError::InvalidInput(format!(
                "learner name must have at least {} characters",
                self.min_name_len
            )));
        }

        self.learner = Some(name.to_string());
        self.reset_progress();
        info!(target: "session", learner = name, total = self.total(), bank = %self.bank.name, "session started");
        Ok(())
    }

    /// Score the current question and reveal its answer.
    pub fn submit_answer(
        &mut self,
        choice: Verdict,
        selected: &BTreeSet<JustificationOption>,
    ) -> Result<&Outcome> {
        self.require(Phase::InProgress, "submit an answer")?;
        if self.revealed {
            return Err(self.transition_error("submit an answer"));
        }
        if choice.needs_justification() && selected.is_empty() {
            return Err(QuizError::JustificationRequired);
        }

        let identifier = self.order[self.index].clone();
        let expected = self.rules.assess(&identifier);
        let correct = choice == expected.verdict;
        if correct {
            self.score += 1;
        }

        let selected = if choice.needs_justification() {
            selected.clone()
        } else {
            BTreeSet::new()
        };
        let justification_matched = (expected.verdict == Verdict::Invalid)
            .then(|| justification::matches(&selected, &expected.reasons));

        debug!(
            target: "session",
            %identifier,
            chosen = %choice,
            expected = %expected.verdict,
            correct,
            ?justification_matched,
            "answer submitted"
        );

        self.revealed = true;
        Ok(&*self.last_outcome.insert(Outcome {
            identifier,
            chosen: choice,
            correct,
            expected,
            selected,
            justification_matched,
        }))
    }

    /// Move past a revealed answer. Reaching the end persists the result exactly once.
    pub fn advance(&mut self, store: &dyn ScoreStore) -> Result<Progress> {
        if self.phase() != Phase::InProgress || !self.revealed {
            return Err(self.transition_error("advance"));
        }

        self.index += 1;
        self.revealed = false;
        self.last_outcome = None;

        if self.index < self.total() {
            return Ok(Progress::Next);
        }

        if !self.saved_once {
            // Marked before the write: a failed append is reported, not retried.
            self.saved_once = true;
            let learner_name = self.learner.clone().unwrap_or_default();
            let record = ScoreRecord::now(&learner_name, self.score, self.total() as u32);
            let save_warning = match store.append(&record) {
                Ok(()) => None,
                Err(e) => {
                    warn!(target: "session", learner = %learner_name, error = %e, "could not save score record");
                    Some(e.to_string())
                }
            };
            info!(
                target: "session",
                learner = %learner_name,
                score = record.score,
                total = record.total,
                percent = record.percent,
                "session completed"
            );
            self.completion = Some(Completion {
                learner_name,
                score: record.score,
                total: record.total,
                percent: record.percent,
                save_warning,
            });
        }

        self.completion
            .clone()
            .map(Progress::Completed)
            .ok_or_else(|| self.transition_error("advance"))
    }

    /// Play again under the same learner with a fresh order.
    pub fn restart(&mut self) -> Result<()> {
        if self.learner.is_none() {
            return Err(self.transition_error("restart"));
        }
        self.reset_progress();
        info!(target: "session", learner = ?self.learner, "session restarted");
        Ok(())
    }

    /// Forget the learner and any unfinished progress. Nothing is persisted.
    pub fn change_learner(&mut self) {
        if let Some(name) = self.learner.take() {
            debug!(target: "session", learner = %name, index = self.index, "learner cleared");
        }
        self.order.clear();
        self.index = 0;
        self.score = 0;
        self.revealed = false;
        self.last_outcome = None;
        self.saved_once = false;
        self.completion = None;
    }

    fn reset_progress(&mut self) {
        let mut order = self.bank.identifiers().to_vec();
        self.order_source.arrange(&mut order);
        self.order = order;
        self.index = 0;
        self.score = 0;
        self.revealed = false;
        self.last_outcome = None;
        self.saved_once = false;
        self.completion = None;
    }

    fn require(&self, phase: Phase, operation: &'static str) -> Result<()> {
        if self.phase() == phase {
            Ok(())
        } else {
            Err(self.transition_error(operation))
        }
    }

    fn transition_error(&self, operation: &'static str) -> QuizError {
        let phase = match self.phase() {
            Phase::InProgress if self.revealed => "the answer is revealed".to_string(),
            Phase::InProgress => "awaiting an answer".to_string(),
            other => other.to_string(),
        };
        QuizError::InvalidTransition { operation, phase }
    }
}
