use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default location of the Telco-churn source file.
pub const DEFAULT_DATA_PATH: &str = "data/telco_churn.csv";

/// Default size of the store connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Application configuration.
///
/// Built once at process start and passed by reference to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Source file read by the ingest command
    pub data_path: PathBuf,

    /// Upper bound on pooled store connections
    pub max_connections: u32,
}

impl Config {
    /// Loads configuration from the `.env` file and environment variables.
    ///
    /// Required environment variables:
    /// - `DATABASE_URL`: `PostgreSQL` connection string
    ///
    /// Optional environment variables:
    /// - `CHURN_DATA_PATH`: source file (default: `data/telco_churn.csv`)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is malformed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL environment variable not set")?;

        let data_path = lookup("CHURN_DATA_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_PATH), PathBuf::from);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            data_path,
            max_connections,
        })
    }
}
