//! Queued AI question generation for exams reviewed by their author.
//!
//! A [`Scheduler`] accepts generation requests, runs them one at a time in
//! arrival order against a [`QuestionGenerator`](llm::QuestionGenerator),
//! and records progress on the exam so it can be polled. [`ReviewService`]
//! covers what happens afterwards: manual questions, per-question and bulk
//! edits, and publishing.

pub mod config;
pub mod error;
pub mod exam;
pub mod llm;
pub mod logging;
pub mod review;
pub mod scheduler;
pub mod store;

pub use config::ExamgenConfig;
pub use error::{ConflictReason, ExamgenError, StoreError};
pub use review::ReviewService;
pub use scheduler::{GenerationRequest, Scheduler, SchedulerConfig};
