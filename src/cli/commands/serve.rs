use clap::Args;
use std::path::PathBuf;

use crate::app::{router, AppState};
use crate::cli::{open_store, StoreSource};
use crate::config::config;
use crate::services::GradeServiceConfig;

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (defaults to API_PORT or the environment default)")]
    pub port: Option<u16>,

    #[arg(long, help = "Use an in-memory store instead of Postgres")]
    pub memory: bool,

    #[arg(long, requires = "memory", help = "JSON file of users, courses, subjects and enrollments to preload")]
    pub seed: Option<PathBuf>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting Gradebook API in {:?} mode", config.environment);

    let source = if args.memory {
        StoreSource::Memory(args.seed.as_deref())
    } else {
        StoreSource::Postgres
    };
    let store = open_store(source).await?;
    let state = AppState::new(store, GradeServiceConfig::from_app(config));
    let app = router(state);

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Gradebook API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
