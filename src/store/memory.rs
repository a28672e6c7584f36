use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ExamStore, PublishedExamStore, QuestionStore};
use crate::error::StoreError;
use crate::exam::{
    Exam, ExamId, ExamStatus, PublishedExam, Question, QuestionDraft, QuestionId, QuestionSource,
};

/// In-memory exam documents keyed by id.
///
/// Intended for tests/dev. Each call is atomic per document.
#[derive(Debug, Default)]
pub struct MemoryExamStore {
    exams: RwLock<HashMap<ExamId, Exam>>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an exam outright. Not part of [`ExamStore`]; the queue never deletes.
    pub fn remove(&self, id: ExamId) -> Option<Exam> {
        self.exams
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&id)
    }
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn get(&self, id: ExamId) -> Result<Option<Exam>, StoreError> {
        let exams = self.exams.read().map_err(|_| StoreError::Poisoned)?;
        Ok(exams.get(&id).cloned())
    }

    async fn save(&self, exam: &Exam) -> Result<(), StoreError> {
        let mut exams = self.exams.write().map_err(|_| StoreError::Poisoned)?;
        exams.insert(exam.id, exam.clone());
        Ok(())
    }

    async fn save_unless(&self, exam: &Exam, blocked: ExamStatus) -> Result<bool, StoreError> {
        let mut exams = self.exams.write().map_err(|_| StoreError::Poisoned)?;
        if exams.get(&exam.id).is_some_and(|stored| stored.status == blocked) {
            return Ok(false);
        }
        exams.insert(exam.id, exam.clone());
        Ok(true)
    }

    async fn find_by_status(&self, status: ExamStatus) -> Result<Vec<Exam>, StoreError> {
        let exams = self.exams.read().map_err(|_| StoreError::Poisoned)?;
        Ok(exams
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }
}

/// In-memory question collection, kept in insertion order.
///
/// Lookups by [`QuestionId`] scan the list.
#[derive(Debug, Default)]
pub struct MemoryQuestionStore {
    questions: RwLock<Vec<Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn insert_many(&self, drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, StoreError> {
        let inserted: Vec<Question> = drafts.into_iter().map(QuestionDraft::into_question).collect();
        let mut questions = self.questions.write().map_err(|_| StoreError::Poisoned)?;
        questions.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_where(
        &self,
        exam_id: ExamId,
        source: QuestionSource,
    ) -> Result<usize, StoreError> {
        let mut questions = self.questions.write().map_err(|_| StoreError::Poisoned)?;
        let before = questions.len();
        questions.retain(|q| !(q.exam_id == exam_id && q.source == source));
        Ok(before - questions.len())
    }

    async fn find_by_exam(&self, exam_id: ExamId) -> Result<Vec<Question>, StoreError> {
        let questions = self.questions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        let questions = self.questions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(questions.iter().find(|q| q.id == id).cloned())
    }

    async fn update(&self, question: &Question) -> Result<bool, StoreError> {
        let mut questions = self.questions.write().map_err(|_| StoreError::Poisoned)?;
        match questions.iter_mut().find(|q| q.id == question.id) {
            Some(slot) => {
                *slot = question.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: QuestionId) -> Result<bool, StoreError> {
        let mut questions = self.questions.write().map_err(|_| StoreError::Poisoned)?;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        Ok(questions.len() != before)
    }

    async fn approve_all(&self, exam_id: ExamId) -> Result<usize, StoreError> {
        let mut questions = self.questions.write().map_err(|_| StoreError::Poisoned)?;
        let mut changed = 0;
        for q in questions
            .iter_mut()
            .filter(|q| q.exam_id == exam_id && !q.is_approved)
        {
            q.is_approved = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPublishedExamStore {
    published: RwLock<HashMap<ExamId, PublishedExam>>,
}

impl MemoryPublishedExamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PublishedExamStore for MemoryPublishedExamStore {
    async fn insert(&self, published: &PublishedExam) -> Result<(), StoreError> {
        let mut map = self.published.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(published.exam_id, published.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PublishedExam>, StoreError> {
        let map = self.published.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().find(|p| p.id == id).cloned())
    }

    async fn find_by_exam(&self, exam_id: ExamId) -> Result<Option<PublishedExam>, StoreError> {
        let map = self.published.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&exam_id).cloned())
    }
}
