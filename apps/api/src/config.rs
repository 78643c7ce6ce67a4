use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;

/// Largest accepted submission body, in bytes.
pub const MAX_BODY_BYTES: usize = 1_000_000;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_DATA_DIR: &str = "data";
const CSV_FILE_NAME: &str = "survey-responses.csv";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: AllowedOrigin,
    pub rust_log: String,
    pub storage: StorageConfig,
}

/// Origin echoed in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigin {
    Any,
    Exact(HeaderValue),
}

/// Which store holds survey responses. Chosen once per deployment.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    CsvFile { path: PathBuf },
    Postgres(DatabaseConfig),
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::CsvFile { .. } => "csv",
            StorageConfig::Postgres(_) => "postgres",
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Full connection URL. When set, the individual parts are ignored.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub keep_alive: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = match lookup("SURVEY_BACKEND").as_deref().unwrap_or("csv") {
            "csv" | "file" => StorageConfig::CsvFile {
                path: csv_path(&lookup),
            },
            "postgres" | "database" => StorageConfig::Postgres(DatabaseConfig::from_lookup(&lookup)?),
            other => bail!("SURVEY_BACKEND must be 'csv' or 'postgres', got '{other}'"),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)
                .context("PORT must be a valid port number")?,
            cors_origin: parse_origin(lookup("CORS_ORIGIN"))?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            storage,
        })
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(&lookup, "DB_PORT", 5432).context("DB_PORT must be a valid port number")?,
            user: lookup("DB_USER").unwrap_or_else(|| "survey".to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: lookup("DB_NAME").unwrap_or_else(|| "survey".to_string()),
            keep_alive: match lookup("DB_KEEP_ALIVE") {
                Some(raw) => parse_flag(&raw)
                    .with_context(|| format!("DB_KEEP_ALIVE must be a boolean, got '{raw}'"))?,
                None => true,
            },
        })
    }
}

fn csv_path(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    match lookup("CSV_PATH") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
            .join(CSV_FILE_NAME),
    }
}

fn parse_origin(raw: Option<String>) -> Result<AllowedOrigin> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("*") => Ok(AllowedOrigin::Any),
        Some(origin) => HeaderValue::from_str(origin)
            .map(AllowedOrigin::Exact)
            .with_context(|| format!("CORS_ORIGIN '{origin}' is not a valid header value")),
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.cors_origin, AllowedOrigin::Any);
        assert_eq!(config.rust_log, "info");
        assert_eq!(
            config.storage,
            StorageConfig::CsvFile {
                path: PathBuf::from("data").join("survey-responses.csv")
            }
        );
    }

    #[test]
    fn test_csv_path_overrides_data_dir() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATA_DIR", "/var/lib/survey"),
            ("CSV_PATH", "/tmp/answers.csv"),
        ]))
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::CsvFile {
                path: PathBuf::from("/tmp/answers.csv")
            }
        );
    }

    #[test]
    fn test_data_dir_sets_default_file_location() {
        let config = Config::from_lookup(lookup_from(&[("DATA_DIR", "/var/lib/survey")])).unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::CsvFile {
                path: PathBuf::from("/var/lib/survey/survey-responses.csv")
            }
        );
    }

    #[test]
    fn test_postgres_backend() {
        let config = Config::from_lookup(lookup_from(&[
            ("SURVEY_BACKEND", "postgres"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "ankieta"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "responses"),
            ("DB_KEEP_ALIVE", "off"),
        ]))
        .unwrap();
        let StorageConfig::Postgres(db) = config.storage else {
            panic!("expected postgres storage");
        };
        assert_eq!(db.url, None);
        assert_eq!(db.host, "db.internal");
        assert_eq!(db.port, 6543);
        assert_eq!(db.user, "ankieta");
        assert_eq!(db.password, "secret");
        assert_eq!(db.name, "responses");
        assert!(!db.keep_alive);
    }

    #[test]
    fn test_keep_alive_defaults_on() {
        let db = DatabaseConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(db.keep_alive);
        assert_eq!(db.port, 5432);
    }

    #[test]
    fn test_debug_redacts_password() {
        let db = DatabaseConfig::from_lookup(lookup_from(&[("DB_PASSWORD", "hunter2")])).unwrap();
        assert!(!format!("{db:?}").contains("hunter2"));
    }

    #[test]
    fn test_exact_cors_origin() {
        let config =
            Config::from_lookup(lookup_from(&[("CORS_ORIGIN", "https://survey.example.com")]))
                .unwrap();
        assert_eq!(
            config.cors_origin,
            AllowedOrigin::Exact(HeaderValue::from_static("https://survey.example.com"))
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SURVEY_BACKEND", "redis")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CORS_ORIGIN", "bad\norigin")])).is_err());
        assert!(DatabaseConfig::from_lookup(lookup_from(&[("DB_KEEP_ALIVE", "maybe")])).is_err());
    }
}
