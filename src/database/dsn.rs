use sqlx::mysql::MySqlConnectOptions;

use crate::{config::DbEnv, error::DsnError};

const DSN_PARAMS: &str = "charset=utf8mb4&parseTime=True&loc=Local";

// Database configuration properties used to build the connection string
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// `host:port`
    pub server_name: String,
    pub user: String,
    pub password: String,
    pub db: String,
}

impl ConnectionConfig {
    pub fn from_env(env: &DbEnv) -> Self {
        Self {
            server_name: format!("{}:{}", env.db_host, env.db_port),
            user: env.db_user.clone(),
            password: env.db_pass.clone(),
            db: env.db_name.clone(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_name", &self.server_name)
            .field("user", &self.user)
            .field("password", &"********")
            .field("db", &self.db)
            .finish()
    }
}

/// Formats `user:password@(host:port)/dbname?charset=utf8mb4&parseTime=True&loc=Local`.
pub fn connection_string(config: &ConnectionConfig) -> String {
    format!(
        "{}:{}@({})/{}?{}",
        config.user, config.password, config.server_name, config.db, DSN_PARAMS
    )
}

/// Same as the connection string with the password masked, for log output.
pub fn redacted(dsn: &str) -> String {
    match (dsn.find(':'), dsn.rfind("@(")) {
        (Some(colon), Some(at)) if colon < at => {
            format!("{}:********{}", &dsn[..colon], &dsn[at..])
        }
        _ => dsn.to_string(),
    }
}

/// A connection string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub params: Vec<(String, String)>,
}

impl Dsn {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

pub fn parse(dsn: &str) -> Result<Dsn, DsnError> {
    let at = dsn.rfind("@(").ok_or(DsnError::MissingAddress)?;
    let (credentials, rest) = (&dsn[..at], &dsn[at + 2..]);

    let (user, password) = credentials
        .split_once(':')
        .ok_or(DsnError::MissingPassword)?;

    let close = rest.find(')').ok_or(DsnError::UnterminatedAddress)?;
    let (address, rest) = (&rest[..close], &rest[close + 1..]);
    let (host, port) = address
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)))
        .filter(|(host, _)| !host.is_empty())
        .ok_or_else(|| DsnError::InvalidAddress(address.to_string()))?;

    let rest = rest.strip_prefix('/').ok_or(DsnError::MissingDatabase)?;
    let (database, query) = rest.split_once('?').unwrap_or((rest, ""));
    if database.is_empty() {
        return Err(DsnError::MissingDatabase);
    }

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k.to_string(), v.to_string())
        })
        .collect();

    Ok(Dsn {
        user: user.to_string(),
        password: password.to_string(),
        host: host.to_string(),
        port,
        database: database.to_string(),
        params,
    })
}

// parseTime and loc have no driver counterpart: DATETIME columns always
// decode into chrono types and timestamps are written with NOW(3).
impl From<&Dsn> for MySqlConnectOptions {
    fn from(dsn: &Dsn) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&dsn.host)
            .port(dsn.port)
            .username(&dsn.user)
            .database(&dsn.database);
        if !dsn.password.is_empty() {
            options = options.password(&dsn.password);
        }
        if let Some(charset) = dsn.param("charset") {
            options = options.charset(charset);
        }
        options
    }
}
