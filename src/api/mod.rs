//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.
//! Every route is mounted both at the root and under `/api`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod tasks;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use dto::{CreateTaskRequest, DeleteResponse, TaskResponse, UpdateTaskRequest};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{AppState, HealthResponse, health_check};
pub use tasks::{ApiJson, create_task, delete_task, get_task, list_tasks, task_stats, update_task};

/// Routes without state, tracing, or CORS applied.
fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/stats", get(task_stats))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

/// Builds the application router.
///
/// Unsupported methods on a known path answer 405 with an `Allow` header.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
