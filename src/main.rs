//! Multimodal Search command line
//!
//! `serve` runs the search page; the other subcommands are one-shot tools
//! over the same settings.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use multimodal_search::config::{QdrantCredentials, Settings, SettingsLoader};
use multimodal_search::core::error::AppError;
use multimodal_search::embeddings::EmbeddingEngine;
use multimodal_search::indexer::ImageIndexer;
use multimodal_search::logging::{LogFormat, LogLevel, LoggingSystem};
use multimodal_search::search::SearchService;
use multimodal_search::vector::QdrantStore;
use multimodal_search::web::WebServer;

/// Text-to-image similarity search over a Qdrant collection
#[derive(Debug, Parser)]
#[clap(author, name = "multimodal-search", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Settings file (TOML); defaults to ./multimodal-search.toml when present
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[clap(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Override the configured log format (text or json)
    #[clap(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the search page and JSON API
    Serve {
        /// Port to listen on
        #[clap(long)]
        port: Option<u16>,

        /// Directory image paths are served from
        #[clap(long, value_name = "DIR")]
        image_root: Option<PathBuf>,
    },

    /// Run one query and print the hits
    Search {
        /// Text to search for
        query: String,

        /// Number of results (0 uses the configured default)
        #[clap(short, long, default_value_t = 0)]
        limit: usize,

        /// Print JSON instead of `score  path` lines
        #[clap(long)]
        json: bool,
    },

    /// Embed every image under a directory into the collection
    Index {
        /// Directory to scan recursively
        dir: PathBuf,

        /// Points per upsert request
        #[clap(long)]
        batch_size: Option<usize>,
    },

    /// List the collections visible with the configured credentials
    Collections,

    /// Download the CLIP models into the model cache
    FetchModels,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{}", app.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut loader = SettingsLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    let mut settings = loader.load().map_err(AppError::from)?;

    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }

    if let Command::FetchModels = cli.command {
        let _logging = LoggingSystem::init(settings.logging.clone()).map_err(AppError::from)?;
        return fetch_models(&settings).await;
    }

    // Credentials are checked before anything touches the network
    let credentials = settings.credentials().map_err(AppError::from)?;
    let _logging = LoggingSystem::init(settings.logging.clone()).map_err(AppError::from)?;

    match cli.command {
        Command::Serve { port, image_root } => {
            let (store, engine) = connect(&settings, &credentials).await?;
            engine.preload_text().await.map_err(AppError::from)?;

            let search = Arc::new(SearchService::new(
                engine,
                store,
                settings.collection.clone(),
                settings.search.clone(),
            ));
            search.verify_collection().await.map_err(AppError::from)?;

            let mut web = settings.server.clone();
            if let Some(port) = port {
                web.port = port;
            }
            if let Some(root) = image_root {
                web.image_root = root;
            }

            WebServer::new(search, web)
                .start()
                .await
                .map_err(AppError::from)?;
        }
        Command::Search { query, limit, json } => {
            let (store, engine) = connect(&settings, &credentials).await?;
            let search = SearchService::new(
                engine,
                store,
                settings.collection.clone(),
                settings.search.clone(),
            );
            let hits = search
                .search_images(&query, limit)
                .await
                .map_err(AppError::from)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&hits).context("Failed to encode results")?
                );
            } else if hits.is_empty() && !query.trim().is_empty() {
                println!("{}", multimodal_search::web::NO_RESULTS_MESSAGE);
            } else {
                for hit in &hits {
                    println!("{}  {}", hit.display_score(), hit.path);
                }
            }
        }
        Command::Index { dir, batch_size } => {
            let mut config = settings.indexer.clone();
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size.max(1);
            }

            let (store, engine) = connect(&settings, &credentials).await?;
            engine.preload_image().await.map_err(AppError::from)?;

            let indexer = ImageIndexer::new(engine, store, settings.collection.clone(), config);
            let report = indexer.run(&dir).await.map_err(AppError::from)?;

            println!(
                "Indexed {} of {} images into '{}'",
                report.indexed, report.discovered, settings.collection.name
            );
            for skipped in &report.skipped {
                println!("skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }
        Command::Collections => {
            let (store, engine) = connect(&settings, &credentials).await?;
            let search = SearchService::new(
                engine,
                store,
                settings.collection.clone(),
                settings.search.clone(),
            );
            for name in search.list_collections().await.map_err(AppError::from)? {
                let marker = if name == settings.collection.name { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        Command::FetchModels => return fetch_models(&settings).await,
    }

    Ok(())
}

/// Check Qdrant is reachable, then set up the lazily loaded encoders
async fn connect(
    settings: &Settings,
    credentials: &QdrantCredentials,
) -> anyhow::Result<(Arc<QdrantStore>, Arc<EmbeddingEngine>)> {
    let store = QdrantStore::connect(credentials, &settings.qdrant)
        .await
        .map_err(AppError::from)?;
    tracing::info!("Connected to Qdrant at {}", store.url());

    let engine = EmbeddingEngine::new(settings.models.clone()).map_err(AppError::from)?;
    Ok((Arc::new(store), Arc::new(engine)))
}

async fn fetch_models(settings: &Settings) -> anyhow::Result<()> {
    let engine = EmbeddingEngine::new(settings.models.clone()).map_err(AppError::from)?;
    let manager = engine.model_manager();

    let files = manager.fetch_all().await.map_err(AppError::from)?;
    for file in &files {
        println!("{}", file.display());
    }
    println!("Models ready in {}", manager.cache_dir().display());
    Ok(())
}
