//! One-shot CSV export of the `survey_responses` table, for schedulers and
//! operators. Writes the same bytes as `GET /api/survey/export`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use survey_api::config::DatabaseConfig;
use survey_api::db::create_pool;
use survey_api::export::serialize;
use survey_api::store::{PgSurveyStore, SurveyStore};

#[derive(Debug, Parser)]
#[command(name = "survey-export", version, about = "Export stored survey responses as CSV")]
struct Cli {
    /// Write the CSV here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let db_config = DatabaseConfig::from_env()?;

    // stdout carries the CSV, so logs go to stderr
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},survey_api={level}",
                env!("CARGO_CRATE_NAME")
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting CSV export...");

    let store = PgSurveyStore::new(create_pool(&db_config)?);
    let records = store
        .read_all()
        .await
        .context("Failed to read survey responses")?;
    info!("Found {} survey responses", records.len());

    let csv = serialize(&records);
    match &cli.output {
        Some(path) => tokio::fs::write(path, csv.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(csv.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    store.close().await;
    info!("CSV export complete");
    Ok(())
}
