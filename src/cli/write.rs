use crate::cli::WriteArgs;
use crate::config::{Config, FailurePolicy, FetchMode};
use crate::error::ConfigError;
use crate::output::render_paper;
use crate::pipeline::{dated_dir, Pipeline};
use crate::prompt::Templates;
use crate::provider::{DocumentModel, GeminiDocumentModel, OpenAiChat};
use crate::search::SerperSearch;
use crate::source::WebSummarizer;
use crate::store::SqliteStore;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything resolved from the config file and the command line
struct Settings {
    config: Config,
    templates: Templates,
    output_dir: PathBuf,
    store_path: Option<PathBuf>,
}

pub async fn execute(args: WriteArgs) -> anyhow::Result<()> {
    let request = read_request(&args)?;
    let settings = load_settings(&args)?;
    let config = &settings.config;

    if args.dry_run {
        info!("DRY RUN - no service calls will be made");
        print_execution_plan(&settings, &args, &request);
        return Ok(());
    }

    let openai_key = args
        .openai_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey("OPENAI_API_KEY"))?;
    let serper_key = args
        .serper_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey("SERPER_API_KEY"))?;

    let chat = Arc::new(OpenAiChat::new(&config.chat, openai_key)?);
    let search = Arc::new(SerperSearch::new(&config.search, serper_key)?);

    let document_model: Option<Arc<dyn DocumentModel>> =
        match (config.document.enabled, args.gemini_api_key.clone()) {
            (true, Some(key)) if !key.trim().is_empty() => {
                Some(Arc::new(GeminiDocumentModel::new(&config.document, key)?))
            }
            _ => None,
        };
    if document_model.is_none() && config.fetch.mode == FetchMode::Document {
        warn!("fetch.mode is document but no document model is configured; every source will be skipped");
    }
    let summarizer = Arc::new(WebSummarizer::new(config.fetch.clone(), document_model)?);

    let mut pipeline = Pipeline::new(
        config.clone(),
        settings.templates,
        chat,
        search,
        summarizer,
    );
    if let Some(path) = &settings.store_path {
        info!("Persisting to {:?}", path);
        let store = SqliteStore::open(path)
            .await
            .with_context(|| format!("Failed to open store {}", path.display()))?;
        pipeline = pipeline.with_store(Arc::new(store));
    }

    info!("Papers will be written to {:?}", dated_dir(&settings.output_dir));
    let report = pipeline.run(&request, Some(&settings.output_dir)).await?;

    if report.paper.details.is_sentinel() {
        warn!("Topic and title could not be extracted; the paper was written without them");
    }
    if let Some(path) = &report.output_path {
        info!("Wrote {}", path.display());
    }
    if let Some(id) = report.paper_id {
        info!("Stored as paper {} (see `hausarbeit show {}`)", id, id);
    }
    info!(
        "{} outline points written in {:.0}s",
        report.paper.outline.len(),
        report.duration.as_secs_f64()
    );
    if args.stdout {
        print!("{}", render_paper(&report.paper));
    } else if let Some(path) = &report.output_path {
        println!("{}", path.display());
    }

    Ok(())
}

fn read_request(args: &WriteArgs) -> anyhow::Result<String> {
    let request = match (&args.input, &args.input_file) {
        (Some(input), _) => input.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("No request given: pass it as an argument or use --input-file"),
    };

    let request = request.trim().to_string();
    if request.is_empty() {
        anyhow::bail!("The request is empty");
    }
    Ok(request)
}

fn load_settings(args: &WriteArgs) -> anyhow::Result<Settings> {
    // Paths in the config file are relative to the file itself
    let (mut config, templates, base) = if args.config.exists() {
        info!("Loading config from {:?}", args.config);
        let config = Config::load(&args.config)?;
        let base = args
            .config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let prompts_dir = Config::resolve(&base, &config.prompts_dir);
        let templates = Templates::load(&prompts_dir)?;
        (config, templates, base)
    } else {
        info!(
            "No config at {:?}, using defaults and built-in prompts",
            args.config
        );
        (Config::default(), Templates::builtin(), PathBuf::new())
    };

    // Apply CLI overrides
    if let Some(min) = args.min_bullets {
        config.outline.min_bullets = min;
    }
    if let Some(max) = args.max_bullets {
        config.outline.max_bullets = max;
    }
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    if args.strict {
        config.on_failure = FailurePolicy::Abort;
    }

    config.validate()?;

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => Config::resolve(&base, &config.output_dir),
    };
    let store_path = if args.no_store {
        None
    } else if let Some(path) = &args.store {
        Some(path.clone())
    } else if config.store.enabled {
        Some(Config::resolve(&base, &config.store.path))
    } else {
        None
    };

    Ok(Settings {
        config,
        templates,
        output_dir,
        store_path,
    })
}

fn print_execution_plan(settings: &Settings, args: &WriteArgs, request: &str) {
    let config = &settings.config;
    println!("\n=== Execution Plan ===\n");
    println!("Request: {}", request);
    println!("Language: {}", config.language);
    println!(
        "Chapters: {}..={}",
        config.outline.min_bullets, config.outline.max_bullets
    );
    println!("On failure: {}", config.on_failure);
    println!("Output dir: {:?}", dated_dir(&settings.output_dir));
    match &settings.store_path {
        Some(path) => println!("Store: {:?}", path),
        None => println!("Store: disabled"),
    }

    println!("\nServices:");
    println!(
        "  - chat: {} at {}{}",
        config.chat.model,
        config.chat.base_url,
        key_status(&args.openai_api_key, "OPENAI_API_KEY")
    );
    let engines: Vec<String> = config.search.engines.iter().map(|e| e.to_string()).collect();
    println!(
        "  - search: {} [{}], up to {} sources per chapter{}",
        config.search.endpoint,
        engines.join(", "),
        config.search.max_sources,
        key_status(&args.serper_api_key, "SERPER_API_KEY")
    );
    if config.document.enabled {
        println!(
            "  - documents: {}{}",
            config.document.model,
            key_status(&args.gemini_api_key, "GEMINI_API_KEY")
        );
    } else {
        println!("  - documents: disabled");
    }
    println!("  - fetch mode: {}", config.fetch.mode);
    println!();
}

fn key_status(key: &Option<String>, var: &str) -> String {
    match key {
        Some(k) if !k.trim().is_empty() => String::new(),
        _ => format!(" [MISSING - set {}]", var),
    }
}
