use std::{net::TcpListener, process::ExitCode, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use togo::{
    config::Config, database, error::BootstrapError, route::create_router, AppState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("togo=info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("could not listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutting down");
}

fn server_error<E>(err: E) -> BootstrapError
where
    E: std::error::Error + Send + Sync + 'static,
{
    BootstrapError::Server(Box::new(err))
}

async fn run() -> Result<(), BootstrapError> {
    let config = Config::from_env()?;

    // Create database connection, tables and sample users
    let pool = database::init(&config).await?;

    let app_state = Arc::new(AppState { db: pool.clone() });
    let app = create_router(app_state, &config.server);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).map_err(server_error)?;
    info!("Server started on: {}", address);

    axum::Server::from_tcp(listener)
        .map_err(server_error)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(server_error)?;

    pool.close().await;
    Ok(())
}

// Entry point of the application; the only place a startup failure ends the process
#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(stage = ?err.stage(), "{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
