use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Model error during {stage}: {source}")]
    Model {
        stage: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid bullet point range {min}..={max}")]
    InvalidBulletRange { min: usize, max: usize },

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read prompt template '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Template '{template}' references unknown placeholder '{{{name}}}'")]
    UnknownPlaceholder { template: String, name: String },
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model response is empty")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Timeout fetching: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {0} for: {1}")]
    Status(u16, String),

    #[error("No content extracted from: {0}")]
    NoContent(String),

    #[error("Unsupported content '{content_type}' at: {url}")]
    Unsupported { url: String, content_type: String },

    #[error("Document model failed for {url}: {source}")]
    Document {
        url: String,
        #[source]
        source: ModelError,
    },
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No JSON object found in model output")]
    NoJson,

    #[error("Outline contains no bullet points")]
    EmptyOutline,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to create store directory: {0}")]
    CreateDir(std::io::Error),

    #[error("No {table} row with id {id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("Malformed id list '{0}'")]
    MalformedIdList(String),

    #[error("Malformed chapter position '{0}'")]
    MalformedPosition(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write document: {0}")]
    Write(std::io::Error),
}
