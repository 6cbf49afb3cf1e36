//! Chat-completion boundary and the Hugging Face router client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use docqa_core::config::GenerationSettings;

use crate::error::BackendError;

/// A chat message for the completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// What a backend produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Candidates(Vec<Message>),
    Empty,
}

impl Completion {
    pub fn from_candidates(candidates: Vec<Message>) -> Self {
        if candidates.is_empty() { Self::Empty } else { Self::Candidates(candidates) }
    }

    /// Text of the first candidate, if it carries any.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::Candidates(c) => c.first().map(|m| m.content.trim()).filter(|t| !t.is_empty()),
            Self::Empty => None,
        }
    }
}

/// Each generation backend implements this.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, BackendError>;
}

/// OpenAI-compatible `/v1/chat/completions` client for the Hugging Face router.
pub struct HfChatBackend {
    client: reqwest::Client,
    token: Option<String>,
    token_env: String,
    model: String,
    base_url: String,
}

impl HfChatBackend {
    /// `token_env` names the variable the token came from; it is only used
    /// in the error reported when no token is present.
    pub fn new(
        token: Option<String>,
        token_env: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            token,
            token_env: token_env.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Token is read from the variable named by `token_env`; a missing token
    /// only fails once a request is made.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, BackendError> {
        let token = std::env::var(&settings.token_env).ok().filter(|t| !t.trim().is_empty());
        Self::new(
            token,
            settings.token_env.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl CompletionBackend for HfChatBackend {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, BackendError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| BackendError::NotConfigured(format!("{} is not set", self.token_env)))?;
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!(url = %url, model = %self.model, "chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status: status.as_u16(), body });
        }

        let resp: serde_json::Value = response.json().await?;
        completion_from_response(&resp)
    }
}

fn completion_from_response(resp: &serde_json::Value) -> Result<Completion, BackendError> {
    let Some(choices) = resp.get("choices") else {
        return Err(BackendError::Parse("missing choices".into()));
    };
    let choices = choices.as_array().ok_or_else(|| BackendError::Parse("choices is not an array".into()))?;
    let candidates = choices
        .iter()
        .filter_map(|c| c.get("message"))
        .map(|m| Message {
            role: m
                .get("role")
                .cloned()
                .and_then(|r| serde_json::from_value(r).ok())
                .unwrap_or(Role::Assistant),
            content: m.get("content").and_then(|c| c.as_str()).unwrap_or_default().to_string(),
        })
        .collect();
    Ok(Completion::from_candidates(candidates))
}
