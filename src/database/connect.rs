use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{error, info};

use super::dsn::{self, ConnectionConfig};
use crate::{config::PoolConfig, error::ConnectError};

pub fn pool_options(pool: &PoolConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(pool.max_open_conns)
        .min_connections(pool.min_idle_conns)
        .max_lifetime(pool.conn_max_lifetime)
        .idle_timeout(pool.idle_timeout)
        .acquire_timeout(pool.acquire_timeout)
}

pub fn connect_options(config: &ConnectionConfig) -> Result<MySqlConnectOptions, ConnectError> {
    let dsn = dsn::connection_string(config);
    let parsed = dsn::parse(&dsn)?;
    Ok(MySqlConnectOptions::from(&parsed))
}

/// Opens the connection pool and checks out one live connection before
/// returning it.
pub async fn connect(
    config: &ConnectionConfig,
    pool: &PoolConfig,
) -> Result<MySqlPool, ConnectError> {
    let dsn = dsn::connection_string(config);
    let options = connect_options(config).map_err(|err| {
        error!(dsn = %dsn::redacted(&dsn), "Could not connect to database: {}", err);
        err
    })?;

    match pool_options(pool).connect_with(options).await {
        Ok(db) => {
            info!(
                server = %config.server_name,
                max_open = pool.max_open_conns,
                min_idle = pool.min_idle_conns,
                "Database connection was successful!"
            );
            Ok(db)
        }
        Err(err) => {
            error!(server = %config.server_name, "Could not connect to database: {}", err);
            Err(err.into())
        }
    }
}
