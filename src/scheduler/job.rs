use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::exam::{ExamId, TransitionError, UserId};
use crate::llm::LlmError;

pub const STARTING_MESSAGE: &str = "Starting AI generation...";
pub const COMPLETE_MESSAGE: &str = "AI generation complete.";

/// Who asked for a generation run, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
}

impl GenerationRequest {
    pub fn new(requested_by: UserId) -> Self {
        Self {
            requested_by,
            requested_at: Utc::now(),
        }
    }
}

/// One queued run. Lives only inside the scheduler channel.
#[derive(Debug, Clone)]
pub(crate) struct GenerationJob {
    pub exam_id: ExamId,
    pub request: GenerationRequest,
}

/// Acknowledgement returned when a job is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub exam_id: ExamId,
    /// Jobs queued or running once this one was added, itself included.
    pub position: usize,
}

/// Questions requested per subject: the total spread evenly, rounded up.
///
/// The sum over all subjects may exceed `total` by up to `subjects - 1`.
pub fn subject_quota(total: u32, subjects: usize) -> u32 {
    match u32::try_from(subjects) {
        Ok(0) => 0,
        Ok(n) => total.div_ceil(n),
        Err(_) => 1,
    }
}

pub fn progress_message(subject: &str, index: usize, total: usize) -> String {
    format!("Generating questions for {subject}... ({index}/{total})")
}

/// Why a dequeued job ended without doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    ExamMissing,
    ExamPublished,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    Completed { questions: usize },
    Skipped(SkipReason),
}

/// Failure inside a running job. Its `Display` is what the exam owner sees
/// after the `"Error: "` prefix.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Generator(#[from] LlmError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("question generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("generation task panicked: {0}")]
    Panicked(String),
}

impl JobError {
    pub fn status_message(&self) -> String {
        format!("Error: {self}")
    }
}
