//! Persistence for survey responses.
//!
//! `SurveyStore` is the single seam between the HTTP layer and storage. Two
//! implementations exist and a deployment picks exactly one at startup:
//! an append-only CSV file (`CsvFileStore`) and a PostgreSQL table
//! (`PgSurveyStore`). `AppState` holds an `Arc<dyn SurveyStore>`.

pub mod csv_file;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::StorageConfig;
use crate::export::csv::CsvParseError;
use crate::models::survey::SurveyResponse;

pub use csv_file::CsvFileStore;
pub use postgres::PgSurveyStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] CsvParseError),

    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

/// Reachability report included in `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Durably adds one record and returns it as stored. A store may move
    /// `created_at` forward to keep its write order. On error the record must
    /// be treated as not stored.
    async fn append(&self, record: SurveyResponse) -> Result<SurveyResponse, StoreError>;

    /// Every stored record, newest first.
    async fn read_all(&self) -> Result<Vec<SurveyResponse>, StoreError>;

    async fn health(&self) -> BackendHealth;

    /// Releases held resources. Called once during shutdown.
    async fn close(&self) {}
}

/// Opens the store selected by configuration.
pub async fn open_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn SurveyStore>> {
    match storage {
        StorageConfig::CsvFile { path } => {
            info!("Storing survey responses in {}", path.display());
            Ok(Arc::new(CsvFileStore::new(path.clone())))
        }
        StorageConfig::Postgres(db) => Ok(Arc::new(PgSurveyStore::connect(db).await?)),
    }
}
