use chrono::NaiveDateTime;

use crate::database::migrate::{Column, Entity, Table};

// Data model representing a user. max_daily_limit is stored but not enforced.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub(crate) id: u64,
    pub(crate) created_at: Option<NaiveDateTime>,
    pub(crate) updated_at: Option<NaiveDateTime>,
    pub(crate) name: String,
    pub(crate) max_daily_limit: i64,
    pub(crate) email: String,
}

// Data model representing a Todo item. user_id is a plain string, it is not
// checked against the users table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub(crate) id: u64,
    pub(crate) created_at: Option<NaiveDateTime>,
    pub(crate) updated_at: Option<NaiveDateTime>,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) completed: bool,
    pub(crate) user_id: String,
}

impl User {
    pub const COLUMNS: &'static str = "id, created_at, updated_at, name, max_daily_limit, email";
}

impl Todo {
    pub const COLUMNS: &'static str =
        "id, created_at, updated_at, name, description, completed, user_id";
}

impl Entity for User {
    const TABLE: Table = Table {
        name: "users",
        columns: &[
            Column {
                name: "name",
                definition: "varchar(255) NOT NULL",
            },
            Column {
                name: "max_daily_limit",
                definition: "bigint NOT NULL DEFAULT 0",
            },
            Column {
                name: "email",
                definition: "varchar(255) NOT NULL DEFAULT ''",
            },
        ],
        indexes: &[],
    };
}

impl Entity for Todo {
    const TABLE: Table = Table {
        name: "todos",
        columns: &[
            Column {
                name: "name",
                definition: "varchar(255) NOT NULL",
            },
            Column {
                name: "description",
                definition: "text NOT NULL",
            },
            Column {
                name: "completed",
                definition: "boolean NOT NULL DEFAULT false",
            },
            Column {
                name: "user_id",
                definition: "varchar(191) NOT NULL DEFAULT ''",
            },
        ],
        indexes: &["user_id"],
    };
}
