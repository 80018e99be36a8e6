use std::{sync::Arc, time::Duration};

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;

use crate::{config::ServerConfig, handler::*, AppState};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(origin, "ignoring invalid CORS origin");
            cors
        }
    }
}

pub fn create_router(app_state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(health_checker_handler))
        .route("/users", get(get_users).post(create_user))
        .route("/users/:id", get(get_user))
        .route("/users/:id/todos", get(get_user_todos))
        .route("/todos", get(get_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(app_state)
        .layer(cors_layer(&server.cors_origin))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}
