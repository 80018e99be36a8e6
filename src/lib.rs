pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod model;
pub mod route;
pub mod schema;

use sqlx::MySqlPool;

// Struct representing the application state
pub struct AppState {
    pub db: MySqlPool,
}
