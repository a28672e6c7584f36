use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::exam::{ExamId, QuestionId, TransitionError, UserId};
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum ExamgenError {
    #[error("Exam not found: {0}")]
    NotFound(ExamId),

    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),

    #[error("Published exam not found: {0}")]
    PublishedExamNotFound(Uuid),

    #[error("User {user} does not own exam {exam}")]
    Forbidden { exam: ExamId, user: UserId },

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Generation scheduler has shut down")]
    SchedulerStopped,

    #[error("Status error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Config error: {0}")]
    Config(String),
}

/// Why a generation request collided with the exam's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyPublished,
    AlreadyProcessing,
    AlreadyQueued,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::AlreadyPublished => write!(f, "exam is already published"),
            ConflictReason::AlreadyProcessing => write!(f, "exam is already being processed"),
            ConflictReason::AlreadyQueued => write!(f, "exam is already queued for generation"),
        }
    }
}

/// Failures reported by the exam and question stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store lock poisoned")]
    Poisoned,
}
