//! Configuration loader for the `agrosense-alerts` service.
//!
//! All runtime configuration values and their defaults live here, loaded
//! from environment variables (with optional `.env` file support provided by
//! the caller), so `env::var` calls are not scattered across the codebase.
//!
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Fields evaluated concurrently during one alert run.
    pub eval_concurrency: usize,

    /// Readings stored concurrently by the parallel batch endpoint.
    pub ingest_concurrency: usize,
}

fn default_ingest_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(8)
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: 0.0.0.0:8080)
/// - `EVAL_CONCURRENCY` – fields evaluated at once (default: 4)
/// - `INGEST_CONCURRENCY` – parallel ingestion width (default: 2 × CPUs)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let bind_addr = parse_env!(
        "BIND_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 8080))
    );
    let eval_concurrency = parse_env!("EVAL_CONCURRENCY", usize, 4);
    let ingest_concurrency = parse_env!("INGEST_CONCURRENCY", usize, default_ingest_concurrency());

    if eval_concurrency == 0 {
        return Err(anyhow!("EVAL_CONCURRENCY must be at least 1"));
    }
    if ingest_concurrency == 0 {
        return Err(anyhow!("INGEST_CONCURRENCY must be at least 1"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        eval_concurrency,
        ingest_concurrency,
    })
}

impl Config {
    /// Mask the password portion of the database URL.
    pub fn masked_db_url(&self) -> String {
        // ---
        let Some(at_pos) = self.db_url.rfind('@') else {
            return self.db_url.clone();
        };
        let user_start = self.db_url.find("://").map_or(0, |p| p + 3);
        if user_start > at_pos {
            return self.db_url.clone();
        }
        // Passwords may themselves contain ':', so split on the first one.
        match self.db_url[user_start..at_pos].find(':') {
            Some(offset) => format!(
                "{}:****{}",
                &self.db_url[..user_start + offset],
                &self.db_url[at_pos..]
            ),
            None => self.db_url.clone(),
        }
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL       : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX        : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR          : {}", self.bind_addr);
        tracing::info!("  EVAL_CONCURRENCY   : {}", self.eval_concurrency);
        tracing::info!("  INGEST_CONCURRENCY : {}", self.ingest_concurrency);
    }
}
