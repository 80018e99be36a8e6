//! Database bootstrap tests.
//!
//! Tests that need a live MySQL server are ignored by default. Run them with
//! `cargo test -- --ignored` and `TEST_DB_NAME` set (`TEST_DB_HOST`,
//! `TEST_DB_PORT`, `TEST_DB_USER` and `TEST_DB_PASS` are optional). They drop
//! and recreate `users` and `todos` in that database.

use serial_test::serial;
use sqlx::{Executor, MySqlPool};
use togo::{
    config::Config,
    database::{self, connect, dsn::ConnectionConfig, migrate, seed, Stage, ENTITIES},
    error::{BootstrapError, ConnectError, DsnError, EXIT_CONNECTION},
};

fn config_with(pairs: &[(&str, &str)]) -> Config {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

fn live_config() -> Config {
    let name = std::env::var("TEST_DB_NAME").expect("TEST_DB_NAME must be set");
    let var = |key: &str, default: &str| {
        std::env::var(format!("TEST_{}", key)).unwrap_or_else(|_| default.to_string())
    };
    let host = var("DB_HOST", "127.0.0.1");
    let port = var("DB_PORT", "3306");
    let user = var("DB_USER", "root");
    let pass = var("DB_PASS", "");

    config_with(&[
        ("DB_HOST", host.as_str()),
        ("DB_PORT", port.as_str()),
        ("DB_USER", user.as_str()),
        ("DB_PASS", pass.as_str()),
        ("DB_NAME", name.as_str()),
        ("DB_MAX_OPEN_CONNS", "2"),
        ("DB_MIN_IDLE_CONNS", "0"),
        ("DB_ACQUIRE_TIMEOUT_SECS", "5"),
    ])
}

async fn empty_database(config: &Config) -> MySqlPool {
    let db = connect::connect(&ConnectionConfig::from_env(&config.db), &config.pool)
        .await
        .unwrap();
    sqlx::query("DROP TABLE IF EXISTS todos, users")
        .execute(&db)
        .await
        .unwrap();
    db
}

async fn schema_snapshot(db: &MySqlPool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT CAST(CONCAT(TABLE_NAME, '.', COLUMN_NAME, ' ', COLUMN_TYPE, ' ', IS_NULLABLE) AS CHAR) \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME IN ('users', 'todos') \
         ORDER BY 1",
    )
    .fetch_all(db)
    .await
    .unwrap()
}

async fn columns_of(db: &MySqlPool, table: &str) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind(table)
    .fetch_all(db)
    .await
    .unwrap()
}

#[tokio::test]
async fn unreachable_database_stops_before_migration() {
    let config = config_with(&[
        ("DB_HOST", "127.0.0.1"),
        ("DB_PORT", "1"),
        ("DB_USER", "rex"),
        ("DB_NAME", "togo"),
        ("DB_MIN_IDLE_CONNS", "0"),
        ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
    ]);

    let err = database::init(&config).await.unwrap_err();

    assert!(matches!(err, BootstrapError::Connection(ConnectError::Database(_))));
    assert!(err.stage() < Stage::SchemaReady);
    assert_eq!(err.exit_code(), EXIT_CONNECTION);
}

#[tokio::test]
async fn malformed_connection_string_is_a_connection_error() {
    let config = config_with(&[
        ("DB_HOST", "bad)host"),
        ("DB_USER", "rex"),
        ("DB_NAME", "togo"),
    ]);

    let err = database::init(&config).await.unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Connection(ConnectError::Dsn(DsnError::InvalidAddress(_)))
    ));
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn migration_creates_both_tables() {
    let config = live_config();
    let db = empty_database(&config).await;

    migrate::auto_migrate(&db, ENTITIES).await.unwrap();

    let users = columns_of(&db, "users").await;
    for column in ["id", "created_at", "updated_at", "deleted_at", "name", "max_daily_limit", "email"] {
        assert!(users.iter().any(|c| c == column), "users.{} missing", column);
    }
    let todos = columns_of(&db, "todos").await;
    for column in ["id", "created_at", "updated_at", "deleted_at", "name", "description", "completed", "user_id"] {
        assert!(todos.iter().any(|c| c == column), "todos.{} missing", column);
    }
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn migration_twice_matches_migration_once() {
    let config = live_config();
    let db = empty_database(&config).await;

    migrate::auto_migrate(&db, ENTITIES).await.unwrap();
    let once = schema_snapshot(&db).await;
    migrate::auto_migrate(&db, ENTITIES).await.unwrap();
    let twice = schema_snapshot(&db).await;

    assert!(!once.is_empty());
    assert_eq!(once, twice);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn migration_adds_missing_columns_to_existing_table() {
    let config = live_config();
    let db = empty_database(&config).await;
    sqlx::query("CREATE TABLE users (id bigint unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY, name varchar(255) NOT NULL)")
        .execute(&db)
        .await
        .unwrap();

    migrate::auto_migrate(&db, ENTITIES).await.unwrap();

    let users = columns_of(&db, "users").await;
    assert!(users.iter().any(|c| c == "max_daily_limit"));
    assert!(users.iter().any(|c| c == "deleted_at"));
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn seeding_inserts_sample_users_only_into_empty_table() {
    let config = live_config();
    let db = empty_database(&config).await;
    migrate::auto_migrate(&db, ENTITIES).await.unwrap();

    let first = seed::seed_users(&db).await.unwrap();
    assert_eq!(first.existing, 0);
    assert_eq!(first.inserted, 3);
    assert_eq!(first.failed, 0);

    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT name, max_daily_limit FROM users ORDER BY id",
    )
    .fetch_all(&db)
    .await
    .unwrap();
    assert_eq!(
        rows,
        vec![
            ("Rex".to_string(), 5),
            ("Riz".to_string(), 4),
            ("Roux".to_string(), 3),
        ]
    );

    let second = seed::seed_users(&db).await.unwrap();
    assert_eq!(second.existing, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(seed::count_users(&db).await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn init_returns_ready_pool() {
    let config = live_config();
    drop(empty_database(&config).await);

    let db = database::init(&config).await.unwrap();

    assert_eq!(seed::count_users(&db).await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires database"]
#[serial]
async fn failed_seed_inserts_are_counted_and_startup_continues() {
    let config = live_config();
    let db = empty_database(&config).await;
    migrate::auto_migrate(&db, ENTITIES).await.unwrap();
    // Plain &str goes over the text protocol; CREATE TRIGGER cannot be prepared
    (&db)
        .execute(
            "CREATE TRIGGER users_reject_insert BEFORE INSERT ON users FOR EACH ROW \
             SIGNAL SQLSTATE '45000' SET MESSAGE_TEXT = 'inserts disabled'",
        )
        .await
        .unwrap();

    let report = seed::seed_users(&db).await.unwrap();
    assert_eq!(report.existing, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.failed, 3);

    let db = database::init(&config).await.unwrap();
    assert_eq!(seed::count_users(&db).await.unwrap(), 0);

    sqlx::query("DROP TABLE IF EXISTS todos, users")
        .execute(&db)
        .await
        .unwrap();
}
