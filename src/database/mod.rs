pub mod connect;
pub mod dsn;
pub mod migrate;
pub mod seed;

use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::BootstrapError,
    model::{Todo, User},
};
use dsn::ConnectionConfig;
use migrate::{Entity, Table};

/// Tables synchronised at startup, in creation order.
pub const ENTITIES: &[&Table] = &[&User::TABLE, &Todo::TABLE];

/// Bootstrap progress. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    EnvLoaded,
    Connected,
    SchemaReady,
    Seeded,
    Ready,
}

fn enter(stage: Stage) {
    info!(?stage, "database bootstrap");
}

/// Seeds sample users, logging instead of failing. `None` means the users
/// table could not be counted and nothing was inserted.
pub async fn seed_best_effort(db: &MySqlPool) -> Option<seed::SeedReport> {
    match seed::seed_users(db).await {
        Ok(report) => {
            if report.failed > 0 {
                warn!(failed = report.failed, "some sample users were not seeded");
            }
            Some(report)
        }
        Err(err) => {
            warn!("skipped seeding sample users: {}", err);
            None
        }
    }
}

/// Connects, migrates and seeds, returning a ready pool. Any failure is
/// returned to the caller; nothing here exits the process.
pub async fn init(config: &Config) -> Result<MySqlPool, BootstrapError> {
    enter(Stage::EnvLoaded);

    let connection = ConnectionConfig::from_env(&config.db);
    info!(config = ?connection, pool = ?config.pool, "DBConfig");

    let db = connect::connect(&connection, &config.pool).await?;
    enter(Stage::Connected);

    migrate::auto_migrate(&db, ENTITIES).await?;
    enter(Stage::SchemaReady);

    seed_best_effort(&db).await;
    enter(Stage::Seeded);

    enter(Stage::Ready);
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Start < Stage::EnvLoaded);
        assert!(Stage::EnvLoaded < Stage::Connected);
        assert!(Stage::Connected < Stage::SchemaReady);
        assert!(Stage::SchemaReady < Stage::Seeded);
        assert!(Stage::Seeded < Stage::Ready);
    }

    #[tokio::test]
    async fn seeding_is_skipped_when_users_cannot_be_counted() {
        use std::time::Duration;

        use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

        let options = MySqlConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("togo")
            .database("togo");
        let db = MySqlPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy_with(options);

        assert_eq!(seed_best_effort(&db).await, None);
    }

    #[test]
    fn users_are_migrated_before_todos() {
        let names: Vec<_> = ENTITIES.iter().map(|t| t.name).collect();
        assert_eq!(names, ["users", "todos"]);
    }
}
