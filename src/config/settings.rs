//! Process settings read from the environment (optionally seeded from a `.env` file).

use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Where to connect. `DATABASE_URL` wins over the individual `DB_*` variables.
#[derive(Clone, Debug)]
pub enum DatabaseSettings {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    },
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            // The URL may carry a password, so it is left out of the error.
            DatabaseSettings::Url(url) => PgConnectOptions::from_str(url)
                .map_err(|_| ConfigError::Settings("DATABASE_URL is not a valid postgres URL".into())),
            DatabaseSettings::Parts {
                host,
                port,
                user,
                password,
                database,
            } => {
                let mut opts = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(database);
                if let Some(p) = password {
                    opts = opts.password(p);
                }
                Ok(opts)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub max_connections: u32,
    /// Bounds both connection establishment and pool checkout.
    pub connect_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub catalog_path: Option<PathBuf>,
    pub enabled_resources: Option<Vec<String>>,
    pub run_migrations: bool,
    pub body_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database = match non_empty("DATABASE_URL") {
            Some(url) => DatabaseSettings::Url(url),
            None => DatabaseSettings::Parts {
                host: non_empty("DB_HOST").unwrap_or_else(|| "localhost".into()),
                port: parse_or(non_empty("DB_PORT"), "DB_PORT", 5432)?,
                user: non_empty("DB_USER").unwrap_or_else(|| "postgres".into()),
                password: get("DB_PASSWORD").filter(|p| !p.is_empty()),
                database: non_empty("DB_NAME").unwrap_or_else(|| "postgres".into()),
            },
        };

        let max_connections = parse_or(non_empty("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::Settings("DB_MAX_CONNECTIONS must be at least 1".into()));
        }
        let timeout_secs = parse_or(
            non_empty("DB_CONNECT_TIMEOUT_SECS"),
            "DB_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;
        let bind_addr = match non_empty("BIND_ADDR") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Settings(format!("BIND_ADDR '{}' is not a socket address", v)))?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::Settings("default bind address".into()))?,
        };
        let enabled_resources = non_empty("ENABLED_RESOURCES").map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });
        let run_migrations = match non_empty("RUN_MIGRATIONS") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| ConfigError::Settings(format!("RUN_MIGRATIONS '{}' is not a boolean", v)))?,
            None => true,
        };

        Ok(Settings {
            database,
            max_connections,
            connect_timeout: Duration::from_secs(timeout_secs),
            bind_addr,
            catalog_path: non_empty("CATALOG_PATH").map(PathBuf::from),
            enabled_resources,
            run_migrations,
            body_limit: parse_or(non_empty("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT)?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::Settings(format!("{} has invalid value '{}'", key, v))),
        None => Ok(default),
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
