//! Review of generated questions by the exam owner.
//!
//! Covers manual questions, per-question approval and edits, bulk approval,
//! and publishing. Every mutating call refuses a `PUBLISHED` exam.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ConflictReason, ExamgenError};
use crate::exam::{
    Exam, ExamId, ExamStatus, NewQuestion, PublishedExam, PublishedQuestion, Question,
    QuestionId, QuestionUpdate, UserId,
};
use crate::store::{ExamStore, PublishedExamStore, QuestionStore};

pub struct ReviewService {
    exams: Arc<dyn ExamStore>,
    questions: Arc<dyn QuestionStore>,
    published: Arc<dyn PublishedExamStore>,
}

impl ReviewService {
    pub fn new(
        exams: Arc<dyn ExamStore>,
        questions: Arc<dyn QuestionStore>,
        published: Arc<dyn PublishedExamStore>,
    ) -> Self {
        Self {
            exams,
            questions,
            published,
        }
    }

    /// Every question of the exam, AI and manual, in insertion order.
    pub async fn questions(
        &self,
        exam_id: ExamId,
        user: UserId,
    ) -> Result<Vec<Question>, ExamgenError> {
        let exam = self.owned_exam(exam_id, user).await?;
        Ok(self.questions.find_by_exam(exam.id).await?)
    }

    /// Store a hand-written question. It starts unapproved.
    pub async fn add_manual_question(
        &self,
        exam_id: ExamId,
        user: UserId,
        question: NewQuestion,
    ) -> Result<Question, ExamgenError> {
        let exam = self.editable_exam(exam_id, user).await?;
        let stored = self
            .questions
            .insert_many(vec![question.into_draft(&exam, user)])
            .await?
            .pop()
            .ok_or_else(|| ExamgenError::InvalidState("store returned no question".into()))?;
        info!(%exam_id, question_id = %stored.id, "manual question added");
        Ok(stored)
    }

    pub async fn approve_question(
        &self,
        question_id: QuestionId,
        user: UserId,
    ) -> Result<Question, ExamgenError> {
        let mut question = self.editable_question(question_id, user).await?;
        question.is_approved = true;
        self.replace(&question).await?;
        Ok(question)
    }

    /// Apply a partial edit. Approval is left as it was.
    pub async fn update_question(
        &self,
        question_id: QuestionId,
        user: UserId,
        update: QuestionUpdate,
    ) -> Result<Question, ExamgenError> {
        let mut question = self.editable_question(question_id, user).await?;
        update.apply(&mut question);
        self.replace(&question).await?;
        Ok(question)
    }

    pub async fn delete_question(
        &self,
        question_id: QuestionId,
        user: UserId,
    ) -> Result<(), ExamgenError> {
        let question = self.editable_question(question_id, user).await?;
        if !self.questions.delete(question.id).await? {
            return Err(ExamgenError::QuestionNotFound(question_id));
        }
        info!(exam_id = %question.exam_id, %question_id, "question deleted");
        Ok(())
    }

    /// Approve every question of the exam. Returns how many changed.
    pub async fn approve_all(&self, exam_id: ExamId, user: UserId) -> Result<usize, ExamgenError> {
        let exam = self.editable_exam(exam_id, user).await?;
        let approved = self.questions.approve_all(exam.id).await?;
        info!(%exam_id, approved, "bulk approved questions");
        Ok(approved)
    }

    /// Freeze the approved questions into a [`PublishedExam`] and lock the exam.
    pub async fn publish(
        &self,
        exam_id: ExamId,
        user: UserId,
    ) -> Result<PublishedExam, ExamgenError> {
        let mut exam = self.editable_exam(exam_id, user).await?;
        if exam.status == ExamStatus::Processing {
            return Err(ExamgenError::Conflict(ConflictReason::AlreadyProcessing));
        }
        if self.published.find_by_exam(exam.id).await?.is_some() {
            return Err(ExamgenError::Conflict(ConflictReason::AlreadyPublished));
        }

        let approved: Vec<PublishedQuestion> = self
            .questions
            .find_by_exam(exam.id)
            .await?
            .into_iter()
            .filter(|q| q.is_approved)
            .map(|q| PublishedQuestion {
                question_id: q.id,
                text: q.text,
                marks: q.marks,
            })
            .collect();
        if approved.is_empty() {
            return Err(ExamgenError::InvalidState(
                "no approved questions to publish".into(),
            ));
        }

        let published = PublishedExam {
            id: Uuid::new_v4(),
            exam_id: exam.id,
            total_marks: approved
                .iter()
                .fold(0u32, |total, q| total.saturating_add(q.marks)),
            questions: approved,
            published_at: Utc::now(),
        };
        self.published.insert(&published).await?;

        exam.transition(ExamStatus::Published, String::new())?;
        self.exams.save(&exam).await?;

        info!(
            %exam_id,
            questions = published.questions.len(),
            total_marks = published.total_marks,
            "exam published"
        );
        Ok(published)
    }

    /// Look up a published exam by its own id. Needs no ownership.
    pub async fn published(&self, published_id: Uuid) -> Result<PublishedExam, ExamgenError> {
        self.published
            .get(published_id)
            .await?
            .ok_or(ExamgenError::PublishedExamNotFound(published_id))
    }

    async fn owned_exam(&self, exam_id: ExamId, user: UserId) -> Result<Exam, ExamgenError> {
        let exam = self
            .exams
            .get(exam_id)
            .await?
            .ok_or(ExamgenError::NotFound(exam_id))?;
        exam.ensure_owned_by(user)?;
        Ok(exam)
    }

    async fn editable_exam(&self, exam_id: ExamId, user: UserId) -> Result<Exam, ExamgenError> {
        let exam = self.owned_exam(exam_id, user).await?;
        if exam.status == ExamStatus::Published {
            return Err(ExamgenError::Conflict(ConflictReason::AlreadyPublished));
        }
        Ok(exam)
    }

    async fn editable_question(
        &self,
        question_id: QuestionId,
        user: UserId,
    ) -> Result<Question, ExamgenError> {
        let question = self
            .questions
            .get(question_id)
            .await?
            .ok_or(ExamgenError::QuestionNotFound(question_id))?;
        self.editable_exam(question.exam_id, user).await?;
        Ok(question)
    }

    async fn replace(&self, question: &Question) -> Result<(), ExamgenError> {
        if self.questions.update(question).await? {
            Ok(())
        } else {
            Err(ExamgenError::QuestionNotFound(question.id))
        }
    }
}
