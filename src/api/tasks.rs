//! Task CRUD handlers.
//!
//! # Endpoints
//!
//! - `GET /tasks`: all tasks, newest first
//! - `POST /tasks`: create a task
//! - `GET /tasks/stats`: aggregate counts over all tasks
//! - `GET /tasks/{id}`: a single task
//! - `PUT /tasks/{id}`: coalesce update
//! - `DELETE /tasks/{id}`: hard delete

use axum::{
    Json,
    extract::{FromRequest, Path, State},
    http::StatusCode,
};

use super::dto::{CreateTaskRequest, DeleteResponse, TaskResponse, UpdateTaskRequest};
use super::error::{ApiErrorResponse, INTERNAL_ERROR_MESSAGE};
use super::handlers::AppState;
use crate::domain::{TaskId, TaskPatch, TaskStats};

// =============================================================================
// Extractors
// =============================================================================

/// JSON body extractor whose rejection uses the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct ApiJson<T>(pub T);

/// Parses a path id. Anything that is not a UUID cannot name a task.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiErrorResponse> {
    raw.parse().map_err(|_| ApiErrorResponse::task_not_found())
}

// =============================================================================
// Handlers
// =============================================================================

/// Lists every task, newest `created_at` first.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let tasks = state.repository().await?.list().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// Fetches a single task.
///
/// # Errors
///
/// Returns 404 if no task has the id, 500 if the store fails.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task_id = parse_task_id(&id)?;

    state
        .repository()
        .await?
        .find_by_id(&task_id)
        .await?
        .map(|task| Json(TaskResponse::from(task)))
        .ok_or_else(ApiErrorResponse::task_not_found)
}

/// Creates a task and returns the stored row.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Buy milk",
///   "description": "Optional description",
///   "priority": "low|medium|high",
///   "category": "general"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 for a missing or blank title, 500 if the store fails.
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let new_task = request.into_new_task(TaskId::generate())?;
    let repository = state.repository().await?;

    repository.insert(&new_task).await?;

    // Re-read so the response carries the store's timestamps
    let task = repository
        .find_by_id(&new_task.task_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(task_id = %new_task.task_id, "Inserted task could not be read back");
            ApiErrorResponse::internal_error(INTERNAL_ERROR_MESSAGE)
        })?;

    tracing::debug!(task_id = %task.task_id, "Task created");
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Applies a partial update.
///
/// # Errors
///
/// Returns 404 if no task has the id, 400 for a malformed body, 500 if
/// the store fails.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task_id = parse_task_id(&id)?;
    let patch = TaskPatch::from(request);

    let task = state.repository().await?.update(&task_id, &patch).await?;

    tracing::debug!(task_id = %task.task_id, "Task updated");
    Ok(Json(TaskResponse::from(task)))
}

/// Deletes a task.
///
/// # Errors
///
/// Returns 404 if no task has the id, 500 if the store fails.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiErrorResponse> {
    let task_id = parse_task_id(&id)?;

    state.repository().await?.delete(&task_id).await?;

    tracing::debug!(task_id = %task_id, "Task deleted");
    Ok(Json(DeleteResponse::task_deleted()))
}

/// Summarizes the full task list.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn task_stats(
    State(state): State<AppState>,
) -> Result<Json<TaskStats>, ApiErrorResponse> {
    let tasks = state.repository().await?.list().await?;
    Ok(Json(TaskStats::from_tasks(&tasks)))
}

// =============================================================================
// Tests
// =============================================================================
