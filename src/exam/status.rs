use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of an exam as seen by the generation queue and the review flow.
///
/// An exam flows through: CREATED → PROCESSING → REVIEW → PUBLISHED.
/// A failed generation reverts PROCESSING back to CREATED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStatus {
    #[default]
    Created,
    Processing,
    Review,
    Published,
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Created => write!(f, "CREATED"),
            ExamStatus::Processing => write!(f, "PROCESSING"),
            ExamStatus::Review => write!(f, "REVIEW"),
            ExamStatus::Published => write!(f, "PUBLISHED"),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move exam from {from} to {to}")]
pub struct TransitionError {
    pub from: ExamStatus,
    pub to: ExamStatus,
}

impl ExamStatus {
    /// Whether `self → next` is a legal edge.
    ///
    /// - `Created` and `Review` may start (or restart) generation.
    /// - `Processing` ends in `Review` on success or `Created` on failure.
    /// - `Created` and `Review` may be published.
    /// - `Published` is terminal.
    pub fn can_transition_to(self, next: ExamStatus) -> bool {
        use ExamStatus::*;
        matches!(
            (self, next),
            (Created, Processing)
                | (Review, Processing)
                | (Processing, Review)
                | (Processing, Created)
                | (Created, Published)
                | (Review, Published)
        )
    }

    pub fn check_transition(self, next: ExamStatus) -> Result<(), TransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ExamStatus::Published
    }
}
