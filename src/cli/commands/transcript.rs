use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::utils::output_success;
use crate::cli::{open_store, OutputFormat, StoreSource};
use crate::config::config;
use crate::services::{GradeService, GradeServiceConfig};

#[derive(Args)]
pub struct TranscriptArgs {
    #[arg(long, help = "Student user id")]
    pub student: Uuid,

    #[arg(long, help = "School cycle (year)")]
    pub cycle: i64,

    #[arg(long, help = "Output file (defaults to the report card's own file name)")]
    pub output: Option<PathBuf>,
}

pub async fn handle(args: TranscriptArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(StoreSource::Postgres).await?;
    let service = GradeService::new(store, GradeServiceConfig::from_app(config()));

    let transcript = service.render_transcript(args.student, args.cycle).await?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&transcript.filename));
    tokio::fs::write(&path, &transcript.bytes).await?;

    output_success(
        &output_format,
        &format!("Report card written to {}", path.display()),
        Some(json!({ "path": path.display().to_string(), "bytes": transcript.bytes.len() })),
    )
}
