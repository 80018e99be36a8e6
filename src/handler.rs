use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use sqlx::{query, query_as};
use tracing::error;

use crate::{
    model::{Todo, User},
    schema::{CreateTodoSchema, CreateUserSchema, UpdateTodoSchema},
    AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    let error_response = json!({
        "status": "fail",
        "message": message.into(),
    });
    (status, Json(error_response))
}

fn database_error(context: &str, err: sqlx::Error) -> ApiError {
    error!("{}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"status": "error", "message": context})),
    )
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "name must not be empty"));
    }
    Ok(())
}

async fn find_user(data: &AppState, id: u64) -> Result<Option<User>, sqlx::Error> {
    query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
        User::COLUMNS
    ))
    .bind(id)
    .fetch_optional(&data.db)
    .await
}

async fn find_todo(data: &AppState, id: u64) -> Result<Option<Todo>, sqlx::Error> {
    query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE id = ? AND deleted_at IS NULL",
        Todo::COLUMNS
    ))
    .bind(id)
    .fetch_optional(&data.db)
    .await
}

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Simple todo API with Rust, SQLX, MySQL, and Axum";

    let json_response = json!({
        "status": "success",
        "message": MESSAGE
    });

    Json(json_response)
}

// Handler for getting all users
pub async fn get_users(State(data): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let users = query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY id",
        User::COLUMNS
    ))
    .fetch_all(&data.db)
    .await
    .map_err(|e| database_error("Something bad happened while fetching all users", e))?;

    let json_response = json!({
        "status": "success",
        "results": users.len(),
        "users": users
    });
    Ok((StatusCode::OK, Json(json_response)))
}

// Handler for creating a new user
pub async fn create_user(
    State(data): State<Arc<AppState>>,
    Json(body): Json<CreateUserSchema>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&body.name)?;

    let result = query(
        "INSERT INTO users (created_at, updated_at, name, max_daily_limit, email) \
         VALUES (NOW(3), NOW(3), ?, ?, ?)",
    )
    .bind(body.name.trim())
    .bind(body.max_daily_limit)
    .bind(&body.email)
    .execute(&data.db)
    .await
    .map_err(|e| database_error("Could not create user", e))?;

    let user = find_user(&data, result.last_insert_id())
        .await
        .map_err(|e| database_error("Could not load created user", e))?
        .ok_or_else(|| fail(StatusCode::INTERNAL_SERVER_ERROR, "Created user vanished"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": {"user": user}})),
    ))
}

// Handler for getting a specific user by ID
pub async fn get_user(
    Path(id): Path<u64>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    match find_user(&data, id).await {
        Ok(Some(user)) => Ok((
            StatusCode::OK,
            Json(json!({"status": "success", "data": {"user": user}})),
        )),
        Ok(None) => Err(fail(
            StatusCode::NOT_FOUND,
            format!("User with ID: {} not found", id),
        )),
        Err(e) => Err(database_error("Could not load user", e)),
    }
}

// Handler for listing the todos that reference a user
pub async fn get_user_todos(
    Path(id): Path<u64>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if find_user(&data, id)
        .await
        .map_err(|e| database_error("Could not load user", e))?
        .is_none()
    {
        return Err(fail(
            StatusCode::NOT_FOUND,
            format!("User with ID: {} not found", id),
        ));
    }

    let todos = query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE user_id = ? AND deleted_at IS NULL ORDER BY id",
        Todo::COLUMNS
    ))
    .bind(id.to_string())
    .fetch_all(&data.db)
    .await
    .map_err(|e| database_error("Could not load todos for user", e))?;

    Ok(Json(json!({
        "status": "success",
        "results": todos.len(),
        "todos": todos
    })))
}

// Handler for getting all Todo items
pub async fn get_todos(State(data): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let todos = query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE deleted_at IS NULL ORDER BY id",
        Todo::COLUMNS
    ))
    .fetch_all(&data.db)
    .await
    .map_err(|e| database_error("Something bad happened while fetching all todo items", e))?;

    let json_response = json!({
        "status": "success",
        "results": todos.len(),
        "todos": todos
    });
    Ok((StatusCode::OK, Json(json_response)))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Json(body): Json<CreateTodoSchema>,
) -> Result<impl IntoResponse, ApiError> {
    require_name(&body.name)?;

    let result = query(
        "INSERT INTO todos (created_at, updated_at, name, description, completed, user_id) \
         VALUES (NOW(3), NOW(3), ?, ?, ?, ?)",
    )
    .bind(body.name.trim())
    .bind(&body.description)
    .bind(body.completed)
    .bind(&body.user_id)
    .execute(&data.db)
    .await
    .map_err(|e| database_error("Could not create todo", e))?;

    let todo = find_todo(&data, result.last_insert_id())
        .await
        .map_err(|e| database_error("Could not load created todo", e))?
        .ok_or_else(|| fail(StatusCode::INTERNAL_SERVER_ERROR, "Created todo vanished"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": {"todo": todo}})),
    ))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    Path(id): Path<u64>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    match find_todo(&data, id).await {
        Ok(Some(todo)) => Ok((
            StatusCode::OK,
            Json(json!({"status": "success", "data": {"todo": todo}})),
        )),
        Ok(None) => Err(fail(
            StatusCode::NOT_FOUND,
            format!("Todo with ID: {} not found", id),
        )),
        Err(e) => Err(database_error("Could not load todo", e)),
    }
}

// Handler for updating a Todo by ID; fields missing from the body keep their value
pub async fn update_todo(
    Path(id): Path<u64>,
    State(data): State<Arc<AppState>>,
    Json(body): Json<UpdateTodoSchema>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &body.name {
        require_name(name)?;
    }

    let current = find_todo(&data, id)
        .await
        .map_err(|e| database_error("Could not load todo", e))?
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                format!("Todo with ID: {} not found", id),
            )
        })?;

    query(
        "UPDATE todos SET updated_at = NOW(3), name = ?, description = ?, completed = ?, user_id = ? \
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(body.name.as_deref().map(str::trim).unwrap_or(&current.name))
    .bind(body.description.as_deref().unwrap_or(&current.description))
    .bind(body.completed.unwrap_or(current.completed))
    .bind(body.user_id.as_deref().unwrap_or(&current.user_id))
    .bind(id)
    .execute(&data.db)
    .await
    .map_err(|e| database_error("Could not update todo", e))?;

    let todo = find_todo(&data, id)
        .await
        .map_err(|e| database_error("Could not load updated todo", e))?
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                format!("Todo with ID: {} not found", id),
            )
        })?;

    Ok(Json(json!({"status": "success", "data": {"todo": todo}})))
}

// Handler for soft deleting a Todo by ID
pub async fn delete_todo(
    Path(id): Path<u64>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows_affected =
        query("UPDATE todos SET deleted_at = NOW(3) WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&data.db)
            .await
            .map_err(|e| database_error("Could not delete todo", e))?
            .rows_affected();
    if rows_affected == 0 {
        return Err(fail(
            StatusCode::NOT_FOUND,
            format!("Todo with ID: {} not found", id),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
