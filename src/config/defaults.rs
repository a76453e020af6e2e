use std::path::PathBuf;

use super::types::{Engine, FetchMode};

pub fn default_version() -> u32 {
    1
}

pub fn default_language() -> String {
    "German".to_string()
}

pub fn default_prompts_dir() -> PathBuf {
    PathBuf::from("prompts")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("papers")
}

pub fn default_min_bullets() -> usize {
    4
}

pub fn default_max_bullets() -> usize {
    6
}

pub fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_document_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

pub fn default_document_model() -> String {
    "gemini-1.5-flash".to_string()
}

pub fn default_document_timeout_sec() -> Option<u64> {
    Some(120)
}

pub fn default_search_endpoint() -> String {
    "https://google.serper.dev".to_string()
}

pub fn default_engines() -> Vec<Engine> {
    vec![Engine::Search]
}

pub fn default_num_results() -> usize {
    10
}

pub fn default_locale() -> String {
    "de".to_string()
}

pub fn default_max_sources() -> usize {
    2
}

pub fn default_search_timeout_sec() -> u64 {
    10
}

pub fn default_fetch_mode() -> FetchMode {
    FetchMode::Auto
}

pub fn default_fetch_timeout_sec() -> u64 {
    5
}

pub fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

pub fn default_max_chars() -> usize {
    12_000
}

pub fn default_store_path() -> PathBuf {
    PathBuf::from("hausarbeit.db")
}

pub fn default_max_attempts() -> u32 {
    1 // No retries unless configured
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_true() -> bool {
    true
}
