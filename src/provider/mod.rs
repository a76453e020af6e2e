mod gemini;
mod openai;

pub use gemini::GeminiDocumentModel;
pub use openai::OpenAiChat;

use crate::error::ModelError;
use async_trait::async_trait;
use serde::Serialize;

/// Every prompt goes out as a single user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Ask the model for a JSON object only
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            json_mode: false,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            json_mode: true,
        }
    }

    /// Content of the last user message
    pub fn last_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Chat-completion model. Implementations return `ModelError::EmptyResponse`
/// when the model produced no text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError>;
}

/// Model that reads a binary document and answers an instruction about it
#[async_trait]
pub trait DocumentModel: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(
        &self,
        content: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, ModelError>;
}

/// Treat blank model output as missing
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ModelError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ModelError::EmptyResponse),
    }
}
