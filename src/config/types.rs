use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Language the paper is written in, substituted as `{language}`
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default)]
    pub outline: OutlineConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub document: DocumentConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// What to do when a model call fails or returns garbage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Substitute a sentinel or placeholder text and keep going
    #[default]
    Placeholder,
    /// Fail the run
    Abort,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Placeholder => write!(f, "placeholder"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct OutlineConfig {
    #[serde(default = "default_min_bullets")]
    pub min_bullets: usize,

    #[serde(default = "default_max_bullets")]
    pub max_bullets: usize,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            min_bullets: default_min_bullets(),
            max_bullets: default_max_bullets(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ChatConfig {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    /// No timeout unless set
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            timeout_sec: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DocumentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_document_base_url")]
    pub base_url: String,

    #[serde(default = "default_document_model")]
    pub model: String,

    #[serde(default = "default_document_timeout_sec")]
    pub timeout_sec: Option<u64>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_document_base_url(),
            model: default_document_model(),
            timeout_sec: default_document_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// General web search
    Search,
    /// Scholarly search
    Scholar,
}

impl Engine {
    pub fn path(&self) -> &'static str {
        match self {
            Engine::Search => "search",
            Engine::Scholar => "scholar",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_engines")]
    pub engines: Vec<Engine>,

    #[serde(default = "default_num_results")]
    pub num_results: usize,

    #[serde(default = "default_locale")]
    pub gl: String,

    #[serde(default = "default_locale")]
    pub hl: String,

    /// Prepended to every query, e.g. `"wikipedia"`
    #[serde(default)]
    pub query_prefix: Option<String>,

    #[serde(default)]
    pub include_topic: bool,

    /// Keep only results whose URL path ends with this extension (e.g. `pdf`)
    #[serde(default)]
    pub file_type: Option<String>,

    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    #[serde(default)]
    pub exclude_domains: Vec<String>,

    #[serde(default = "default_search_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            engines: default_engines(),
            num_results: default_num_results(),
            gl: default_locale(),
            hl: default_locale(),
            query_prefix: None,
            include_topic: false,
            file_type: None,
            max_sources: default_max_sources(),
            exclude_domains: Vec::new(),
            timeout_sec: default_search_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// PDFs go to the document model, everything else is extracted as HTML
    Auto,
    Html,
    Document,
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMode::Auto => write!(f, "auto"),
            FetchMode::Html => write!(f, "html"),
            FetchMode::Document => write!(f, "document"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_mode")]
    pub mode: FetchMode,

    #[serde(default = "default_fetch_timeout_sec")]
    pub timeout_sec: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selector scoping HTML extraction, e.g. `div.mw-parser-output`
    #[serde(default)]
    pub content_selector: Option<String>,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: default_fetch_mode(),
            timeout_sec: default_fetch_timeout_sec(),
            user_agent: default_user_agent(),
            content_selector: None,
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StoreConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}
