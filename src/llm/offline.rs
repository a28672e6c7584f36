use std::time::Duration;

use async_trait::async_trait;

use super::error::LlmError;
use super::generator::{GeneratedQuestion, GenerationParams, QuestionGenerator};

/// Builds recall questions straight from the syllabus sentences.
///
/// Used by `examgen demo` and `--offline` runs where no API key is at hand.
pub struct OfflineGenerator {
    delay: Duration,
}

impl OfflineGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for OfflineGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(400))
    }
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '?', '!', '\n'])
        .map(str::trim)
        .filter(|s| s.split_whitespace().count() >= 3)
        .collect()
}

#[async_trait]
impl QuestionGenerator for OfflineGenerator {
    async fn generate(&self, params: &GenerationParams) -> Result<Vec<GeneratedQuestion>, LlmError> {
        tokio::time::sleep(self.delay).await;

        let pool = sentences(&params.text);
        if pool.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        let subject = params.subjects.join(", ");

        Ok(pool
            .iter()
            .cycle()
            .take(params.count as usize)
            .enumerate()
            .map(|(i, sentence)| GeneratedQuestion {
                text: format!("({subject}) Explain in your own words: \"{sentence}\" [{}]", i + 1),
                marks: 1 + (i as u32 % 3),
                subject: subject.clone(),
                difficulty: params.difficulty.clone(),
                language: params.language.clone(),
            })
            .collect())
    }
}
