use std::time::Duration;

/// Failures talking to a completion backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("backend not configured: {0}")]
    NotConfigured(String),
}

/// Why a question did not produce an answer.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("backend returned no answer")]
    NoAnswer,
    #[error("generation timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
