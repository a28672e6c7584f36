//! Question generation on top of a chat-completions model.
//!
//! [`QuestionGenerator`] is the seam the scheduler calls once per subject.
//! [`LlmQuestionGenerator`] asks the model for a bare JSON array and pulls
//! the outermost `[...]` span out of whatever it answers, since models
//! often wrap JSON in prose or code fences despite being told not to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::ChatSender;
use super::error::LlmError;
use super::types::{ChatMessage, ChatRequest};

/// Input for one generator call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub text: String,
    pub difficulty: String,
    pub subjects: Vec<String>,
    pub count: u32,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub marks: u32,
    pub subject: String,
    pub difficulty: String,
    pub language: String,
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<GeneratedQuestion>, LlmError>;
}

pub struct LlmQuestionGenerator<C> {
    client: C,
    model: String,
    temperature: f32,
}

impl<C: ChatSender> LlmQuestionGenerator<C> {
    pub fn new(client: C, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl<C: ChatSender> QuestionGenerator for LlmQuestionGenerator<C> {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<GeneratedQuestion>, LlmError> {
        let req = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![ChatMessage::user(build_prompt(params))],
        };

        let response = self.client.send_chat(&req).await?;
        let raw = response.first_content().ok_or(LlmError::EmptyContent)?;
        let questions = parse_questions(raw, params)?;
        debug!(
            requested = params.count,
            returned = questions.len(),
            "model answered"
        );
        Ok(questions)
    }
}

pub(crate) fn build_prompt(params: &GenerationParams) -> String {
    format!(
        "You are an exam question generator API.\n\
         \n\
         Answer with a raw JSON array and nothing else: no markdown, no code fences, \
         no commentary before or after the array.\n\
         \n\
         Syllabus:\n\
         {text}\n\
         \n\
         Requirements:\n\
         - Subject: {subjects}\n\
         - Difficulty: {difficulty}\n\
         - Language: {language}\n\
         - Number of questions: {count}\n\
         \n\
         Each array element must look like:\n\
         {{\"text\": \"question text\", \"marks\": <number>, \"subject\": \"<subject>\", \
         \"difficulty\": \"<difficulty>\", \"language\": \"<language>\"}}",
        text = params.text,
        subjects = params.subjects.join(", "),
        difficulty = params.difficulty,
        language = params.language,
        count = params.count,
    )
}

/// Outermost `[` ... `]` span of `raw`, if any.
pub(crate) fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
    #[serde(default)]
    marks: Option<f64>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

pub(crate) fn parse_questions(
    raw: &str,
    params: &GenerationParams,
) -> Result<Vec<GeneratedQuestion>, LlmError> {
    let Some(json) = extract_json_array(raw) else {
        warn!(response = %raw, "model reply has no JSON array");
        return Err(LlmError::NoJson);
    };

    let items: Vec<RawQuestion> = serde_json::from_str(json).map_err(|e| {
        warn!(response = %raw, "model reply is not a question array");
        LlmError::InvalidJson(e)
    })?;

    let fallback_subject = params.subjects.first().cloned().unwrap_or_default();

    Ok(items
        .into_iter()
        .filter(|q| !q.text.trim().is_empty())
        .map(|q| GeneratedQuestion {
            text: q.text.trim().to_string(),
            marks: q.marks.map(|m| m.max(0.0).round() as u32).unwrap_or(1),
            subject: q.subject.unwrap_or_else(|| fallback_subject.clone()),
            difficulty: q.difficulty.unwrap_or_else(|| params.difficulty.clone()),
            language: q.language.unwrap_or_else(|| params.language.clone()),
        })
        .collect())
}
