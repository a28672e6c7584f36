mod model;
mod status;

pub use model::{
    Exam, ExamId, NewExam, NewQuestion, PublishedExam, PublishedQuestion, Question, QuestionDraft,
    QuestionId, QuestionSource, QuestionUpdate, SourceFile, StatusSnapshot, UserId,
};
pub use status::{ExamStatus, TransitionError};
