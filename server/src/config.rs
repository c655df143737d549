// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use flash_sale::queue::{DEFAULT_POP_TIMEOUT, DEFAULT_QUEUE_KEY};
use flash_sale::WorkerPoolConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_max_connections: u32,
  pub redis_url: String,
  pub queue_key: String,

  pub worker_count: usize,
  pub pop_timeout: Duration,

  pub run_migrations: bool,
  // Inserts demo products on startup
  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let or_default = |var_name: &str, default: &str| get_env(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = or_default("SERVER_HOST", "127.0.0.1");
    let server_port = parse_value::<u16>("SERVER_PORT", &or_default("SERVER_PORT", "8080"))?;
    let database_url = get_env("DATABASE_URL")?;
    let db_max_connections = parse_value::<u32>("DB_MAX_CONNECTIONS", &or_default("DB_MAX_CONNECTIONS", "10"))?;
    let redis_url = or_default("REDIS_URL", "redis://127.0.0.1:6379");
    let queue_key = or_default("CHECKOUT_QUEUE_KEY", DEFAULT_QUEUE_KEY);

    let default_workers = WorkerPoolConfig::default().workers.to_string();
    let worker_count = parse_value::<usize>("WORKER_COUNT", &or_default("WORKER_COUNT", &default_workers))?;
    if worker_count == 0 {
      return Err(AppError::Config("WORKER_COUNT must be at least 1".to_string()));
    }
    let pop_timeout_secs = parse_value::<u64>(
      "QUEUE_POP_TIMEOUT_SECS",
      &or_default("QUEUE_POP_TIMEOUT_SECS", &DEFAULT_POP_TIMEOUT.as_secs().to_string()),
    )?;
    if pop_timeout_secs == 0 {
      return Err(AppError::Config("QUEUE_POP_TIMEOUT_SECS must be at least 1".to_string()));
    }

    let run_migrations = parse_value::<bool>("RUN_MIGRATIONS", &or_default("RUN_MIGRATIONS", "true"))?;
    let seed_db = parse_value::<bool>("SEED_DB", &or_default("SEED_DB", "false"))?;
    let log_format = match or_default("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
      "pretty" | "text" => LogFormat::Pretty,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      redis_url,
      queue_key,
      worker_count,
      pop_timeout: Duration::from_secs(pop_timeout_secs),
      run_migrations,
      seed_db,
      log_format,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  pub fn worker_pool(&self) -> WorkerPoolConfig {
    WorkerPoolConfig {
      workers: self.worker_count,
      pop_timeout: self.pop_timeout,
      ..WorkerPoolConfig::default()
    }
  }
}

fn parse_value<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e)))
}
