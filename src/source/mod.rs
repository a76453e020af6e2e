mod extract;

use extract::extract_text;

use crate::config::{FetchConfig, FetchMode};
use crate::error::FetchError;
use crate::provider::DocumentModel;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PDF_MIME: &str = "application/pdf";

/// Turns a source URL into text the section writer can use
#[async_trait]
pub trait SourceSummarizer: Send + Sync {
    /// `instruction` is the rendered summarization prompt for document models
    async fn summarize(&self, url: &str, instruction: &str) -> Result<String, FetchError>;
}

/// Fetches sources over HTTP and extracts or summarizes them
pub struct WebSummarizer {
    client: Client,
    config: FetchConfig,
    document_model: Option<Arc<dyn DocumentModel>>,
}

/// How one fetched resource is turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Html,
    Document,
}

impl WebSummarizer {
    pub fn new(
        config: FetchConfig,
        document_model: Option<Arc<dyn DocumentModel>>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            config,
            document_model,
        })
    }

    fn strategy(&self, url: &str, content_type: &str) -> Strategy {
        pick_strategy(
            self.config.mode,
            is_pdf(url, content_type),
            self.document_model.is_some(),
        )
    }
}

/// The content type decides; the `.pdf` path only counts when the server
/// sends none or a generic binary type.
fn is_pdf(url: &str, content_type: &str) -> bool {
    match content_type.split(';').next().unwrap_or("").trim() {
        "" | "application/octet-stream" => crate::search::has_extension(url, "pdf"),
        mime => mime == PDF_MIME,
    }
}

fn pick_strategy(mode: FetchMode, pdf: bool, has_document_model: bool) -> Strategy {
    match mode {
        FetchMode::Html => Strategy::Html,
        FetchMode::Document => Strategy::Document,
        FetchMode::Auto if pdf && has_document_model => Strategy::Document,
        FetchMode::Auto => Strategy::Html,
    }
}

#[async_trait]
impl SourceSummarizer for WebSummarizer {
    async fn summarize(&self, url: &str, instruction: &str) -> Result<String, FetchError> {
        debug!("Fetching source: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let text = match self.strategy(url, &content_type) {
            Strategy::Document => {
                let Some(model) = self.document_model.as_ref() else {
                    return Err(FetchError::Unsupported {
                        url: url.to_string(),
                        content_type,
                    });
                };
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Http(e.to_string()))?;
                let mime = if is_pdf(url, &content_type) {
                    PDF_MIME.to_string()
                } else {
                    content_type
                        .split(';')
                        .next()
                        .filter(|m| !m.is_empty())
                        .unwrap_or("text/html")
                        .to_string()
                };
                debug!("Summarizing {} ({}) with {}", url, mime, model.name());
                model
                    .summarize(&bytes, &mime, instruction)
                    .await
                    .map_err(|source| FetchError::Document {
                        url: url.to_string(),
                        source,
                    })?
            }
            Strategy::Html => {
                if is_pdf(url, &content_type) {
                    return Err(FetchError::Unsupported {
                        url: url.to_string(),
                        content_type,
                    });
                }
                let html = response
                    .text()
                    .await
                    .map_err(|e| FetchError::Http(e.to_string()))?;
                extract_text(
                    &html,
                    self.config.content_selector.as_deref(),
                    self.config.max_chars,
                )
            }
        };

        if text.trim().is_empty() {
            return Err(FetchError::NoContent(url.to_string()));
        }

        info!("Got {} chars from: {}", text.len(), url);
        Ok(text)
    }
}
