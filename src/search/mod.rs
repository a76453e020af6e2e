//! Source finding: search queries and the selection policy applied to raw results.
//!
//! Selection keeps results in engine order, then result order, drops duplicate
//! URLs and excluded domains, keeps only the configured file type if one is
//! set, and takes the first `max_sources` survivors. An empty selection is a
//! normal outcome; the chapter is then written without material.

mod serper;

pub use serper::SerperSearch;

use crate::config::{Engine, RetryConfig, SearchConfig};
use crate::error::SearchError;
use crate::pipeline::retry_with_backoff;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub link: String,
    pub title: Option<String>,
    pub engine: Engine,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, engine: Engine) -> Result<Vec<SearchHit>, SearchError>;

    fn name(&self) -> &'static str;
}

/// Build the search query for one bullet point
pub fn build_query(bulletpoint: &str, topic: &str, config: &SearchConfig) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(prefix) = config.query_prefix.as_deref() {
        parts.push(prefix);
    }
    if config.include_topic && !topic.trim().is_empty() {
        parts.push(topic.trim());
    }
    parts.push(bulletpoint.trim());
    parts.join(" ")
}

/// Query every configured engine and apply the selection policy
pub async fn find_sources(
    provider: &dyn SearchProvider,
    query: &str,
    config: &SearchConfig,
    retry: &RetryConfig,
) -> Vec<String> {
    let mut hits = Vec::new();
    for engine in &config.engines {
        let result =
            retry_with_backoff(retry, provider.name(), || provider.search(query, *engine)).await;
        match result {
            Ok(found) => {
                debug!(
                    "{} ({}) returned {} results for {:?}",
                    provider.name(),
                    engine,
                    found.len(),
                    query
                );
                for hit in &found {
                    debug!("  {} {}", hit.link, hit.title.as_deref().unwrap_or(""));
                }
                hits.extend(found);
            }
            Err(e) => warn!("Search on {} failed for {:?}: {}", engine, query, e),
        }
    }

    let selected = select_sources(&hits, config);
    if selected.is_empty() {
        info!("No usable sources for {:?}", query);
    }
    selected
}

/// Apply the selection policy to raw hits
pub fn select_sources(hits: &[SearchHit], config: &SearchConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.iter()
        .map(|hit| hit.link.as_str())
        .filter(|link| seen.insert(*link))
        .filter(|link| !is_excluded(link, &config.exclude_domains))
        .filter(|link| {
            config
                .file_type
                .as_deref()
                .map(|ext| has_extension(link, ext))
                .unwrap_or(true)
        })
        .take(config.max_sources)
        .map(str::to_string)
        .collect()
}

/// True when the URL path ends in `.<ext>` (case-insensitive)
pub fn has_extension(link: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    match Url::parse(link) {
        Ok(url) => url
            .path()
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", ext)),
        Err(_) => false,
    }
}

fn is_excluded(link: &str, domains: &[String]) -> bool {
    if domains.is_empty() {
        return false;
    }
    let Some(host) = Url::parse(link).ok().and_then(|u| u.host_str().map(str::to_string)) else {
        return true;
    };
    domains.iter().any(|d| {
        let d = d.trim_start_matches('.');
        host == d || host.ends_with(&format!(".{}", d))
    })
}
