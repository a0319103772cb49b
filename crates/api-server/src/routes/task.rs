//! Task API endpoints
//!
//! RESTful API for task CRUD operations and weekly statistics.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use dayplan_core::task::{NewTask, Task, TaskPatch, WeeklyStats};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub date: Option<String>,
    /// Case-insensitive search over title and description
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a store failure to a 500, logging it
pub fn store_error(action: &str, e: dayplan_core::Error) -> ApiError {
    tracing::error!("Error {}: {}", action, e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("Invalid task data: {}", rejection.body_text()),
    )
}

fn task_not_found(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Task {} not found", id))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List tasks, optionally for one day
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .task_store()
        .list(query.date.as_deref())
        .await
        .map_err(|e| store_error("fetching tasks", e))?;

    let tasks = match query.q.as_deref() {
        Some(q) => tasks.into_iter().filter(|t| t.matches_query(q)).collect(),
        None => tasks,
    };
    Ok(Json(tasks))
}

/// GET /api/tasks/stats - Completion counts for a date range
async fn weekly_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<WeeklyStats>, ApiError> {
    let (Some(start_date), Some(end_date)) = (query.start_date, query.end_date) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "startDate and endDate are required",
        ));
    };

    let stats = state
        .task_store()
        .weekly_stats(&start_date, &end_date)
        .await
        .map_err(|e| store_error("fetching stats", e))?;

    Ok(Json(stats))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(input) = payload.map_err(invalid_body)?;
    input
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let created = state
        .task_store()
        .create(input)
        .await
        .map_err(|e| store_error("creating task", e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .task_store()
        .get(&id)
        .await
        .map_err(|e| store_error("fetching task", e))?;

    task.map(Json).ok_or_else(|| task_not_found(&id))
}

/// PATCH /api/tasks/{id} - Update the supplied fields of a task
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(patch) = payload.map_err(invalid_body)?;
    patch
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let updated = state
        .task_store()
        .update(&id, patch)
        .await
        .map_err(|e| store_error("updating task", e))?;

    updated.map(Json).ok_or_else(|| task_not_found(&id))
}

/// DELETE /api/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .task_store()
        .delete(&id)
        .await
        .map_err(|e| store_error("deleting task", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found(&id))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/stats", get(weekly_stats))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}
