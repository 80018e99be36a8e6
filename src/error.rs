use thiserror::Error;

use crate::database::Stage;

// Exit codes follow sysexits(3) so operators can tell failure classes apart
pub const EXIT_CONFIG: u8 = 78;
pub const EXIT_CONNECTION: u8 = 69;
pub const EXIT_MIGRATION: u8 = 70;
pub const EXIT_SERVER: u8 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DsnError {
    #[error("missing `@(` separator between credentials and address")]
    MissingAddress,

    #[error("missing `:` separator between user and password")]
    MissingPassword,

    #[error("unterminated address, expected `)`")]
    UnterminatedAddress,

    #[error("address {0:?} is not host:port")]
    InvalidAddress(String),

    #[error("missing `/dbname` after address")]
    MissingDatabase,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("malformed connection string: {0}")]
    Dsn(#[from] DsnError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
#[error("could not migrate table `{table}`: {source}")]
pub struct MigrationError {
    pub table: &'static str,
    #[source]
    pub source: sqlx::Error,
}

/// Fatal startup failure. Only the binary entry point turns one of these
/// into a process exit.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not connect to database: {0}")]
    Connection(#[from] ConnectError),

    #[error("could not create tables to database: {0}")]
    Migration(#[from] MigrationError),

    #[error("http server failed: {0}")]
    Server(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BootstrapError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Config(_) => EXIT_CONFIG,
            BootstrapError::Connection(_) => EXIT_CONNECTION,
            BootstrapError::Migration(_) => EXIT_MIGRATION,
            BootstrapError::Server(_) => EXIT_SERVER,
        }
    }

    /// Last stage the bootstrap sequence reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            BootstrapError::Config(_) => Stage::Start,
            BootstrapError::Connection(_) => Stage::EnvLoaded,
            BootstrapError::Migration(_) => Stage::Connected,
            BootstrapError::Server(_) => Stage::Ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_failure_class() {
        let codes = [EXIT_CONFIG, EXIT_CONNECTION, EXIT_MIGRATION, EXIT_SERVER];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn connection_failure_stops_before_schema() {
        let err = BootstrapError::from(ConnectError::from(DsnError::MissingDatabase));
        assert_eq!(err.exit_code(), EXIT_CONNECTION);
        assert!(err.stage() < Stage::SchemaReady);
    }

    #[test]
    fn config_failure_reports_start_stage() {
        let err = BootstrapError::from(ConfigError::Missing("DB_NAME"));
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert_eq!(err.stage(), Stage::Start);
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing required environment variable DB_NAME"
        );
    }
}
