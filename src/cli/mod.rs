pub mod init;
pub mod schema;
pub mod show;
pub mod write;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hausarbeit")]
#[command(
    author,
    version,
    about = "Writes academic term papers from a one-line request using web research and language models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a paper
    Write(WriteArgs),

    /// Create a default config file and prompt templates
    Init(InitArgs),

    /// List stored papers or print one of them
    Show(ShowArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct WriteArgs {
    /// What the paper should be about, in your own words
    #[arg(value_name = "REQUEST", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the request from a file
    #[arg(long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, default_value = "hausarbeit.yaml")]
    pub config: PathBuf,

    /// Override output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Override the smallest number of chapters
    #[arg(long)]
    pub min_bullets: Option<usize>,

    /// Override the largest number of chapters
    #[arg(long)]
    pub max_bullets: Option<usize>,

    /// Override the language the paper is written in
    #[arg(long)]
    pub language: Option<String>,

    /// Persist papers, chapters and sources to this SQLite file
    #[arg(long, value_name = "PATH", conflicts_with = "no_store")]
    pub store: Option<PathBuf>,

    /// Do not persist, even if the config enables the store
    #[arg(long)]
    pub no_store: bool,

    /// Fail the run on the first model error instead of writing placeholders
    #[arg(long)]
    pub strict: bool,

    /// Show plan without calling any service
    #[arg(long)]
    pub dry_run: bool,

    /// Print the finished paper to stdout
    #[arg(long)]
    pub stdout: bool,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true)]
    pub serper_api_key: Option<String>,

    /// Enables PDF summaries through the document model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    /// Directory to initialize
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    /// SQLite file written by `write --store`
    #[arg(long, default_value = "hausarbeit.db")]
    pub store: PathBuf,

    /// Paper id; lists all papers when omitted
    pub id: Option<i64>,
}
