use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{ExamStatus, TransitionError};
use crate::error::ExamgenError;
use crate::llm::GeneratedQuestion;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Identifies one exam record.
    ExamId
);
id_type!(
    /// Identifies a user account.
    UserId
);
id_type!(
    /// Identifies one stored question.
    QuestionId
);

/// Text extracted from one uploaded study file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub original_name: String,
    pub extracted_text: String,
}

/// Fields a caller supplies when creating an exam.
#[derive(Debug, Clone, Default)]
pub struct NewExam {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub difficulty: String,
    pub subjects: Vec<String>,
    pub language: String,
    pub number_of_questions: u32,
    pub created_by: UserId,
    pub files: Vec<SourceFile>,
}

/// An exam document as held by the exam store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub difficulty: String,
    pub subjects: Vec<String>,
    pub language: String,
    pub number_of_questions: u32,
    pub created_by: UserId,
    pub files: Vec<SourceFile>,
    pub status: ExamStatus,
    pub processing_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    pub fn new(new: NewExam) -> Self {
        let now = Utc::now();
        Self {
            id: ExamId::new(),
            title: new.title,
            description: new.description,
            instructions: new.instructions,
            difficulty: new.difficulty,
            subjects: new.subjects,
            language: new.language,
            number_of_questions: new.number_of_questions,
            created_by: new.created_by,
            files: new.files,
            status: ExamStatus::Created,
            processing_message: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// All extracted file text joined with newlines.
    pub fn combined_text(&self) -> String {
        self.files
            .iter()
            .map(|f| f.extracted_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_source_text(&self) -> bool {
        self.files
            .iter()
            .any(|f| !f.extracted_text.trim().is_empty())
    }

    pub fn ensure_owned_by(&self, user: UserId) -> Result<(), ExamgenError> {
        if self.created_by == user {
            Ok(())
        } else {
            Err(ExamgenError::Forbidden {
                exam: self.id,
                user,
            })
        }
    }

    /// Move to `next` and overwrite the progress message.
    pub fn transition(
        &mut self,
        next: ExamStatus,
        message: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.status.check_transition(next)?;
        self.status = next;
        self.processing_message = message.into();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_processing_message(&mut self, message: impl Into<String>) {
        self.processing_message = message.into();
        self.updated_at = Utc::now();
    }

    /// Put the exam back to `Created` after a failed run.
    ///
    /// Unlike [`Exam::transition`] this does not require the exam to be in
    /// `Processing`: a job may fail before its first status write lands.
    /// Published exams are left untouched.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ExamStatus::Created;
        self.processing_message = message.into();
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            processing_message: self.processing_message.clone(),
        }
    }
}

/// What a status poll returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: ExamStatus,
    pub processing_message: String,
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionSource {
    Ai,
    Manual,
}

/// A question that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub exam_id: ExamId,
    pub text: String,
    pub marks: u32,
    pub subject: String,
    pub difficulty: String,
    pub language: String,
    pub source: QuestionSource,
    pub is_approved: bool,
    pub created_by: UserId,
}

impl QuestionDraft {
    /// Unapproved AI question owned by the exam's creator.
    pub fn ai(exam: &Exam, generated: GeneratedQuestion) -> Self {
        Self {
            exam_id: exam.id,
            text: generated.text,
            marks: generated.marks,
            subject: generated.subject,
            difficulty: generated.difficulty,
            language: generated.language,
            source: QuestionSource::Ai,
            is_approved: false,
            created_by: exam.created_by,
        }
    }

    pub fn into_question(self) -> Question {
        Question {
            id: QuestionId::new(),
            exam_id: self.exam_id,
            text: self.text,
            marks: self.marks,
            subject: self.subject,
            difficulty: self.difficulty,
            language: self.language,
            source: self.source,
            is_approved: self.is_approved,
            created_by: self.created_by,
            created_at: Utc::now(),
        }
    }
}

/// Question written by hand by the exam owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub marks: u32,
    pub subject: String,
    pub difficulty: String,
    pub language: String,
}

impl NewQuestion {
    /// Unapproved manual draft for `exam`, authored by `author`.
    pub fn into_draft(self, exam: &Exam, author: UserId) -> QuestionDraft {
        QuestionDraft {
            exam_id: exam.id,
            text: self.text,
            marks: self.marks,
            subject: self.subject,
            difficulty: self.difficulty,
            language: self.language,
            source: QuestionSource::Manual,
            is_approved: false,
            created_by: author,
        }
    }
}

/// Partial edit of a stored question. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionUpdate {
    pub text: Option<String>,
    pub marks: Option<u32>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
}

impl QuestionUpdate {
    pub fn apply(self, question: &mut Question) {
        if let Some(text) = self.text {
            question.text = text;
        }
        if let Some(marks) = self.marks {
            question.marks = marks;
        }
        if let Some(subject) = self.subject {
            question.subject = subject;
        }
        if let Some(difficulty) = self.difficulty {
            question.difficulty = difficulty;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub exam_id: ExamId,
    pub text: String,
    pub marks: u32,
    pub subject: String,
    pub difficulty: String,
    pub language: String,
    pub source: QuestionSource,
    pub is_approved: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Frozen copy of one approved question inside a published exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedQuestion {
    pub question_id: QuestionId,
    pub text: String,
    pub marks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedExam {
    pub id: Uuid,
    pub exam_id: ExamId,
    pub questions: Vec<PublishedQuestion>,
    pub total_marks: u32,
    pub published_at: DateTime<Utc>,
}
