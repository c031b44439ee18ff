pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::config;
use crate::database::{DatabaseManager, MemoryStore, PgStore, SchoolStore, SeedData};

#[derive(Parser)]
#[command(name = "gradebook-api")]
#[command(about = "Gradebook API - grade bookkeeping, summaries and report cards")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Create the database schema")]
    Migrate,

    #[command(about = "Print a signed access token")]
    Token(commands::token::TokenArgs),

    #[command(about = "Render a student's report card to a PDF file")]
    Transcript(commands::transcript::TranscriptArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Where the server and the offline commands read school data from
pub enum StoreSource<'a> {
    Postgres,
    /// In-memory store, optionally preloaded from a JSON seed file
    Memory(Option<&'a Path>),
}

/// Read a JSON seed file of users, courses, subjects and enrollments
pub fn load_seed(path: &Path) -> anyhow::Result<SeedData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Postgres store from DATABASE_URL, or an in-memory store
pub async fn open_store(source: StoreSource<'_>) -> anyhow::Result<Arc<dyn SchoolStore>> {
    if let StoreSource::Memory(seed) = source {
        tracing::warn!("using in-memory store; data is lost on exit");
        let store = match seed {
            Some(path) => {
                let seed = load_seed(path)?;
                tracing::info!(
                    users = seed.users.len(),
                    courses = seed.courses.len(),
                    enrollments = seed.enrollments.len(),
                    "loaded seed from {}",
                    path.display()
                );
                MemoryStore::from_seed(seed)
            }
            None => MemoryStore::new(),
        };
        return Ok(Arc::new(store));
    }
    let pool = DatabaseManager::connect(&config().database).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve(args) => commands::serve::handle(args).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Transcript(args) => commands::transcript::handle(args, output_format).await,
    }
}
