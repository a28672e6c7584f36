//! Persistence collaborators used by the scheduler and the review flow.
//!
//! The traits are the seam: the scheduler only needs per-document reads and
//! writes, so any document store can sit behind them. [`memory`] provides
//! the in-process implementation used by the CLI and the tests.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::exam::{
    Exam, ExamId, ExamStatus, PublishedExam, Question, QuestionDraft, QuestionId, QuestionSource,
};

pub use memory::{MemoryExamStore, MemoryPublishedExamStore, MemoryQuestionStore};

#[async_trait]
pub trait ExamStore: Send + Sync {
    /// `Ok(None)` when no exam has this id.
    async fn get(&self, id: ExamId) -> Result<Option<Exam>, StoreError>;

    /// Insert or replace the whole document.
    async fn save(&self, exam: &Exam) -> Result<(), StoreError>;

    /// Replace the document unless the stored copy is currently in `blocked`.
    ///
    /// Returns `Ok(false)` and writes nothing when it is. The check and the
    /// write happen as one step.
    async fn save_unless(&self, exam: &Exam, blocked: ExamStatus) -> Result<bool, StoreError>;

    async fn find_by_status(&self, status: ExamStatus) -> Result<Vec<Exam>, StoreError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn insert_many(&self, drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, StoreError>;

    /// Remove every question of `exam_id` with the given source; returns how many went.
    async fn delete_where(
        &self,
        exam_id: ExamId,
        source: QuestionSource,
    ) -> Result<usize, StoreError>;

    async fn find_by_exam(&self, exam_id: ExamId) -> Result<Vec<Question>, StoreError>;

    async fn get(&self, id: QuestionId) -> Result<Option<Question>, StoreError>;

    /// Replace a stored question. Returns `false` if it no longer exists.
    async fn update(&self, question: &Question) -> Result<bool, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: QuestionId) -> Result<bool, StoreError>;

    /// Mark every question of the exam approved; returns how many changed.
    async fn approve_all(&self, exam_id: ExamId) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait PublishedExamStore: Send + Sync {
    async fn insert(&self, published: &PublishedExam) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<PublishedExam>, StoreError>;

    async fn find_by_exam(&self, exam_id: ExamId) -> Result<Option<PublishedExam>, StoreError>;
}
