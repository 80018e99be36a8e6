// Struct representing the request body for creating a new User
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserSchema {
    pub name: String,
    #[serde(default)]
    pub max_daily_limit: i64,
    #[serde(default)]
    pub email: String,
}

// Struct representing the request body for creating a new Todo
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: String,
}

// Struct representing the request body for updating a Todo; absent fields are kept
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoSchema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub user_id: Option<String>,
}
