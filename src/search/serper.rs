use super::{SearchHit, SearchProvider};
use crate::config::{Engine, SearchConfig};
use crate::error::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serper.dev Google search API
pub struct SerperSearch {
    api_key: String,
    endpoint: String,
    num: usize,
    gl: String,
    hl: String,
    timeout: Duration,
    client: Client,
}

impl SerperSearch {
    pub fn new(config: &SearchConfig, api_key: String) -> Result<Self, SearchError> {
        let timeout = Duration::from_secs(config.timeout_sec);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            num: config.num_results,
            gl: config.gl.clone(),
            hl: config.hl.clone(),
            timeout,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    gl: &'a str,
    hl: &'a str,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    link: String,
    #[serde(default)]
    title: Option<String>,
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str, engine: Engine) -> Result<Vec<SearchHit>, SearchError> {
        let body = SerperRequest {
            q: query,
            num: self.num,
            gl: &self.gl,
            hl: &self.hl,
        };

        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, engine.path()))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(self.timeout)
                } else {
                    SearchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let data: SerperResponse = response.json().await?;
        Ok(data
            .organic
            .into_iter()
            .map(|r| SearchHit {
                link: r.link,
                title: r.title,
                engine,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "serper"
    }
}
