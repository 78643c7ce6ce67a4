use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Connections kept by the pool.
pub const POOL_SIZE: u32 = 10;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS survey_responses (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        profession TEXT NOT NULL,
        experience TEXT NOT NULL,
        ai_areas TEXT NOT NULL,
        challenge TEXT NOT NULL,
        expectations TEXT NOT NULL,
        time_spent TEXT NOT NULL,
        frustration TEXT NOT NULL,
        data_consent SMALLINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_survey_responses_created_at ON survey_responses (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_survey_responses_email ON survey_responses (email)",
];

pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    match &config.url {
        Some(url) => {
            PgConnectOptions::from_str(url).context("DATABASE_URL is not a valid PostgreSQL URL")
        }
        None => Ok(PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)),
    }
}

/// Creates a PostgreSQL connection pool. Connections are opened on first use,
/// so an unreachable server does not fail startup.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let options = connect_options(config)?;

    let pool_options = PgPoolOptions::new()
        .max_connections(POOL_SIZE)
        .acquire_timeout(ACQUIRE_TIMEOUT);

    let pool_options = if config.keep_alive {
        pool_options
            .idle_timeout(Option::<Duration>::None)
            .max_lifetime(Option::<Duration>::None)
    } else {
        pool_options.idle_timeout(IDLE_TIMEOUT)
    };

    info!("PostgreSQL pool configured ({POOL_SIZE} connections, keep-alive: {})", config.keep_alive);
    Ok(pool_options.connect_lazy_with(options))
}

/// Round-trips a trivial query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Creates the `survey_responses` table and its indexes when absent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
