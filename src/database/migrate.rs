use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::error::MigrationError;

/// A column as it appears in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub definition: &'static str,
}

/// Declared shape of an entity table, excluding the base model columns that
/// every table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Single-column secondary indexes, named `idx_<table>_<column>`.
    pub indexes: &'static [&'static str],
}

pub trait Entity {
    const TABLE: Table;
}

// id, timestamps and soft delete marker shared by all entities
pub const MODEL_COLUMNS: &[Column] = &[
    Column {
        name: "id",
        definition: "bigint unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY",
    },
    Column {
        name: "created_at",
        definition: "datetime(3) NULL",
    },
    Column {
        name: "updated_at",
        definition: "datetime(3) NULL",
    },
    Column {
        name: "deleted_at",
        definition: "datetime(3) NULL",
    },
];

impl Table {
    pub fn all_columns(&self) -> impl Iterator<Item = &'static Column> {
        MODEL_COLUMNS.iter().chain(self.columns.iter())
    }

    /// `(index name, column)` pairs, including the soft delete index.
    pub fn all_indexes(&self) -> Vec<(String, &'static str)> {
        std::iter::once("deleted_at")
            .chain(self.indexes.iter().copied())
            .map(|column| (format!("idx_{}_{}", self.name, column), column))
            .collect()
    }
}

/// Columns and indexes currently present for one table. Empty `columns`
/// means the table does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Existing {
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
}

impl Existing {
    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.eq_ignore_ascii_case(name))
    }
}

pub fn create_table_sql(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .all_columns()
        .map(|column| format!("  `{}` {}", column.name, column.definition))
        .collect();
    lines.extend(
        table
            .all_indexes()
            .into_iter()
            .map(|(name, column)| format!("  INDEX `{}` (`{}`)", name, column)),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS `{}` (\n{}\n)",
        table.name,
        lines.join(",\n")
    )
}

/// Statements that bring an existing table up to the declared shape. Only
/// additive changes are produced: nothing is dropped or redefined.
pub fn plan(table: &Table, existing: &Existing) -> Vec<String> {
    if existing.columns.is_empty() {
        return vec![create_table_sql(table)];
    }

    let mut statements: Vec<String> = table
        .all_columns()
        .filter(|column| !existing.has_column(column.name))
        .map(|column| {
            format!(
                "ALTER TABLE `{}` ADD COLUMN `{}` {}",
                table.name, column.name, column.definition
            )
        })
        .collect();

    statements.extend(
        table
            .all_indexes()
            .into_iter()
            .filter(|(name, _)| !existing.has_index(name))
            .map(|(name, column)| format!("CREATE INDEX `{}` ON `{}` (`{}`)", name, table.name, column)),
    );

    statements
}

async fn introspect(db: &MySqlPool, table: &str) -> Result<Existing, sqlx::Error> {
    // CAST keeps information_schema values decodable as text on MySQL 8
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind(table)
    .fetch_all(db)
    .await?;

    let indexes = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT CAST(INDEX_NAME AS CHAR) FROM information_schema.STATISTICS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind(table)
    .fetch_all(db)
    .await?;

    Ok(Existing { columns, indexes })
}

/// Creates missing tables and adds missing columns and indexes, in the
/// order the tables are given.
pub async fn auto_migrate(db: &MySqlPool, tables: &[&Table]) -> Result<(), MigrationError> {
    for table in tables {
        let fail = |source| MigrationError {
            table: table.name,
            source,
        };

        let existing = introspect(db, table.name).await.map_err(fail)?;
        let statements = plan(table, &existing);
        if statements.is_empty() {
            debug!(table = table.name, "schema up to date");
            continue;
        }

        for statement in &statements {
            debug!(table = table.name, %statement, "applying schema change");
            sqlx::query(statement).execute(db).await.map_err(fail)?;
        }
        info!(
            table = table.name,
            created = existing.columns.is_empty(),
            changes = statements.len(),
            "schema migrated"
        );
    }
    Ok(())
}
