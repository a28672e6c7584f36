//! Error types for the chat-completions client and the question parser.
//!
//! [`LlmError`] covers the transport side (rate limiting, API errors,
//! network failures) and the content side (no JSON array in the reply,
//! JSON that does not match the question shape).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP 429. `retry_after_ms` comes from the `retry-after` header.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-2xx status, with the response body as message.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("model returned no content")]
    EmptyContent,

    #[error("AI did not return JSON")]
    NoJson,

    #[error("AI returned invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}
