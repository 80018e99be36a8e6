use std::{fmt, str::FromStr, time::Duration};

use crate::error::ConfigError;

// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Raw database credentials as read from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct DbEnv {
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_name: String,
}

impl fmt::Debug for DbEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbEnv")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_pass", &"********")
            .field("db_name", &self.db_name)
            .finish()
    }
}

/// Connection pool limits applied when the database pool is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_open_conns: u32,
    /// Connections the pool keeps open even when idle. Clamped to
    /// `max_open_conns`; idle connections above it close after `idle_timeout`.
    pub min_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open_conns: 10,
            min_idle_conns: 2,
            conn_max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DbEnv,
    pub pool: PoolConfig,
}

impl Config {
    /// Reads configuration from the process environment, loading `.env` first
    /// if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let server = ServerConfig {
            host: or("HOST", "127.0.0.1"),
            port: parse_or(&lookup, "PORT", 3000)?,
            cors_origin: or("CORS_ORIGIN", "http://localhost:3000"),
        };

        let db_port: u16 = parse_or(&lookup, "DB_PORT", 3306)?;
        let db = DbEnv {
            db_host: or("DB_HOST", "localhost"),
            db_port: db_port.to_string(),
            db_user: required("DB_USER")?,
            db_pass: lookup("DB_PASS").unwrap_or_default(),
            db_name: required("DB_NAME")?,
        };

        let defaults = PoolConfig::default();
        let max_open_conns = parse_or(&lookup, "DB_MAX_OPEN_CONNS", defaults.max_open_conns)?;
        if max_open_conns == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_OPEN_CONNS",
                value: "0".to_string(),
            });
        }
        let min_idle_conns: u32 =
            parse_or(&lookup, "DB_MIN_IDLE_CONNS", defaults.min_idle_conns)?;
        let secs = |key: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&lookup, key, default.as_secs()).map(Duration::from_secs)
        };
        let pool = PoolConfig {
            max_open_conns,
            min_idle_conns: min_idle_conns.min(max_open_conns),
            conn_max_lifetime: secs("DB_CONN_MAX_LIFETIME_SECS", defaults.conn_max_lifetime)?,
            idle_timeout: secs("DB_CONN_IDLE_TIMEOUT_SECS", defaults.idle_timeout)?,
            acquire_timeout: secs("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout)?,
        };

        Ok(Config { server, db, pool })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { key, value }),
        },
    }
}
