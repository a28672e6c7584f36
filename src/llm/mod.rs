pub mod client;
pub mod error;
pub mod generator;
pub mod offline;
pub mod types;

pub use client::{ChatSender, LlmClient};
pub use error::LlmError;
pub use generator::{GeneratedQuestion, GenerationParams, LlmQuestionGenerator, QuestionGenerator};
pub use offline::OfflineGenerator;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Usage};
