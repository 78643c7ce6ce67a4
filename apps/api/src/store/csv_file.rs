use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::export::csv::{header_line, parse_rows, record_from_fields, render_record};
use crate::models::survey::SurveyResponse;
use crate::store::{BackendHealth, StoreError, SurveyStore};

/// Append-only CSV file. The first write to a missing or empty file also
/// writes the header row.
///
/// `createdAt` never decreases down the file: a record stamped before the
/// last written one (it lost the race for the lock) is stored with the last
/// written timestamp instead.
pub struct CsvFileStore {
    path: PathBuf,
    // Held across the size check and the write so the header is written once
    // and rows never interleave. Readers take it too, to avoid half-written rows.
    // The guarded value is the `createdAt` of the last row this process wrote.
    lock: Mutex<Option<DateTime<Utc>>>,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileStore {
            path: path.into(),
            lock: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).await,
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SurveyStore for CsvFileStore {
    async fn append(&self, mut record: SurveyResponse) -> Result<SurveyResponse, StoreError> {
        let mut last_written = self.lock.lock().await;
        if let Some(last) = *last_written {
            record.created_at = record.created_at.max(last);
        }
        self.ensure_parent_dir().await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut chunk = String::new();
        if file.metadata().await?.len() == 0 {
            chunk.push_str(&header_line());
        }
        chunk.push_str(&render_record(&record));

        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;
        *last_written = Some(record.created_at);
        Ok(record)
    }

    async fn read_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        let text = {
            let _guard = self.lock.lock().await;
            match fs::read_to_string(&self.path).await {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
        };

        let mut records = Vec::new();
        for row in parse_rows(&text)? {
            if row.is_header() {
                continue;
            }
            let record = record_from_fields(&row.fields)
                .map_err(|reason| StoreError::Corrupt { line: row.line, reason })?;
            records.push(record);
        }

        // File order is submission order. The stable sort keeps equal
        // timestamps newest-written first.
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn health(&self) -> BackendHealth {
        BackendHealth {
            backend: "csv",
            reachable: true,
            data_path: Some(self.path.display().to_string()),
            error: None,
        }
    }
}
