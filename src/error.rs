//! Error types shared by the quiz engine, the score stores and the admin area.
//!
//! Every variant is recoverable: callers re-prompt, show a warning, or skip
//! the offending row. None of them leave a session in an unusable state.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    /// Learner input rejected before any state change
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid / poor-practice answers need at least one justification
    #[error("select at least one justification for this answer")]
    JustificationRequired,

    /// Backing medium for score records could not be read or written
    #[error("score storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored row could not be decoded
    #[error("malformed score record: {0}")]
    MalformedRecord(String),

    /// Operation invoked outside the phase that accepts it
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: String,
    },

    #[error("instructor login required")]
    NotAuthenticated,

    #[error("unknown question bank: {0}")]
    UnknownBank(String),

    /// Embedded content failed to load
    #[error("content error: {0}")]
    Content(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for QuizError {
    fn from(e: std::io::Error) -> Self {
        QuizError::StorageUnavailable(e.to_string())
    }
}

impl From<csv::Error> for QuizError {
    fn from(e: csv::Error) -> Self {
        QuizError::StorageUnavailable(e.to_string())
    }
}

impl From<rusqlite::Error> for QuizError {
    fn from(e: rusqlite::Error) -> Self {
        QuizError::StorageUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
