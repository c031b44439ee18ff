use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{DatabaseManager, PgStore};

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database).await?;
    let store = PgStore::new(pool.clone());
    store.migrate(&config().grading).await?;
    DatabaseManager::close(pool).await;

    output_success(&output_format, "Schema is up to date", None)
}
