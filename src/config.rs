// src/config.rs

use std::{env, net::SocketAddr, str::FromStr};

use anyhow::{Context, bail};
use dotenvy::dotenv;

/// Which Entity Store backend the service runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("STORE must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    /// Required for the Postgres store.
    pub database_url: Option<String>,
    pub listen_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    pub db_max_connections: u32,
    pub request_timeout_secs: u64,
    /// Unset means notifications are only logged.
    pub notifier_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let store: StoreKind = var_or("STORE", "postgres").parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE=postgres");
        }

        let listen_addr = var_or("LISTEN_ADDR", "0.0.0.0:8095")
            .parse()
            .context("LISTEN_ADDR must be a socket address")?;

        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;

        let request_timeout_secs = var_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            store,
            database_url,
            listen_addr,
            rust_log: var_or("RUST_LOG", "info"),
            log_dir: var_or("LOG_DIR", "logs"),
            db_max_connections,
            request_timeout_secs,
            notifier_url: env::var("NOTIFIER_URL").ok().filter(|url| !url.is_empty()),
        })
    }

    /// In-memory configuration for tests and local runs.
    pub fn memory() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            db_max_connections: 5,
            request_timeout_secs: 30,
            notifier_url: None,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
