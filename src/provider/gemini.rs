use super::{non_empty, DocumentModel};
use crate::config::DocumentConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent` with the document sent inline
pub struct GeminiDocumentModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiDocumentModel {
    pub fn new(config: &DocumentConfig, api_key: String) -> Result<Self, ModelError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_sec {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

fn request_body(content: &[u8], mime_type: &str, instruction: &str) -> serde_json::Value {
    let data = base64::engine::general_purpose::STANDARD.encode(content);
    serde_json::json!({
        "contents": [
            {
                "parts": [
                    {"inline_data": {"mime_type": mime_type, "data": data}},
                    {"text": instruction}
                ]
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

#[async_trait]
impl DocumentModel for GeminiDocumentModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(
        &self,
        content: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        // Keep the key out of the URL, reqwest errors print it
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body(content, mime_type, instruction))
            .send()
            .await
            .map_err(|e| ModelError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Http(e.without_url()))?;
        let text = non_empty(data.into_text())?;
        debug!(
            "{} summarized {} bytes into {} chars",
            self.model,
            content.len(),
            text.len()
        );
        Ok(text)
    }
}
