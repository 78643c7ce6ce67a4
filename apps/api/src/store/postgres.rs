use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::db::{create_pool, ensure_schema, ping};
use crate::models::survey::{SurveyResponse, SurveyResponseRow};
use crate::store::{BackendHealth, StoreError, SurveyStore};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// `survey_responses` table in PostgreSQL. Owns its connection pool.
pub struct PgSurveyStore {
    pool: PgPool,
}

impl PgSurveyStore {
    pub fn new(pool: PgPool) -> Self {
        PgSurveyStore { pool }
    }

    /// Builds the pool and prepares the schema. An unreachable database is
    /// logged, not fatal: each request retries through the pool.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = create_pool(config)?;

        match ping(&pool).await {
            Ok(()) => {
                info!("PostgreSQL connection successful");
                if let Err(e) = ensure_schema(&pool).await {
                    error!("Failed to initialize survey_responses table: {e}");
                }
            }
            Err(e) => warn!("PostgreSQL unreachable at startup, continuing: {e}"),
        }

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn append(&self, record: SurveyResponse) -> Result<SurveyResponse, StoreError> {
        let row = SurveyResponseRow::from_record(&record)?;

        sqlx::query(
            r#"
            INSERT INTO survey_responses
                (id, email, profession, experience, ai_areas, challenge,
                 expectations, time_spent, frustration, data_consent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(&row.email)
        .bind(&row.profession)
        .bind(&row.experience)
        .bind(&row.ai_areas)
        .bind(&row.challenge)
        .bind(&row.expectations)
        .bind(&row.time_spent)
        .bind(&row.frustration)
        .bind(row.data_consent)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn read_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        let rows: Vec<SurveyResponseRow> = sqlx::query_as(
            r#"
            SELECT id, email, profession, experience, ai_areas, challenge,
                   expectations, time_spent, frustration, data_consent, created_at
            FROM survey_responses
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| SurveyResponse::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn health(&self) -> BackendHealth {
        let error = match tokio::time::timeout(HEALTH_TIMEOUT, ping(&self.pool)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("timed out".to_string()),
        };

        BackendHealth {
            backend: "postgres",
            reachable: error.is_none(),
            data_path: None,
            error,
        }
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "survey".to_string(),
            password: String::new(),
            name: "survey".to_string(),
            keep_alive: true,
        }
    }

    #[tokio::test]
    async fn test_unreachable_database_does_not_fail_startup() {
        let store = PgSurveyStore::connect(&unreachable_config()).await;
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let store = PgSurveyStore::new(create_pool(&unreachable_config()).unwrap());
        let health = store.health().await;
        assert_eq!(health.backend, "postgres");
        assert!(!health.reachable);
        assert!(health.error.is_some());
    }
}
