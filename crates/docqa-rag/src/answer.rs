use std::sync::Arc;
use std::time::Duration;

use docqa_core::config::GenerationSettings;

use crate::completion::{CompletionBackend, Message};
use crate::error::GenerationError;
use crate::retrieval::assemble_context;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions using only the provided context.";
pub const NO_ANSWER: &str = "No answer found.";

/// Asks the completion backend to answer a question from retrieved context.
pub struct AnswerGenerator {
    backend: Arc<dyn CompletionBackend>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>, settings: &GenerationSettings) -> Self {
        Self {
            backend,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn answer(&self, question: &str, context_chunks: &[String]) -> Result<String, GenerationError> {
        let messages = build_messages(question, context_chunks);
        tracing::debug!(chunks = context_chunks.len(), max_tokens = self.max_tokens, "generating answer");
        let completion = tokio::time::timeout(
            self.timeout,
            self.backend.complete(messages, self.temperature, self.max_tokens),
        )
        .await
        .map_err(|_| GenerationError::Timeout(self.timeout))??;
        completion.first_text().map(str::to_string).ok_or(GenerationError::NoAnswer)
    }
}

pub fn build_messages(question: &str, context_chunks: &[String]) -> Vec<Message> {
    let context = assemble_context(context_chunks);
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!("Context: {}\n\nQuestion: {}", context, question)),
    ]
}

/// Text shown to the user for an answer attempt. Failures become a
/// placeholder or a short description instead of an error.
pub fn render_answer(result: Result<String, GenerationError>) -> String {
    match result {
        Ok(text) => text,
        Err(GenerationError::NoAnswer) => NO_ANSWER.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "answer generation failed");
            format!("Error during inference: {}", e)
        }
    }
}
