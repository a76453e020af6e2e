use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod output;
mod paper;
mod parser;
mod pipeline;
mod prompt;
mod provider;
mod search;
mod source;
mod store;
#[cfg(test)]
mod test_support;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys may come from a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hausarbeit=debug")
    } else {
        EnvFilter::new("hausarbeit=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Write(args) => cli::write::execute(args).await,
        Commands::Init(args) => cli::init::execute(args),
        Commands::Show(args) => cli::show::execute(args).await,
        Commands::Schema => cli::schema::execute(),
    }
}
