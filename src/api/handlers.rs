//! Shared application state and the health endpoint.

use std::sync::Arc;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infrastructure::{RepositoryError, TaskRepository};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Holds the repository as a trait object so the backend chosen by
/// `RepositoryFactory` at startup can be injected without generics.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository>,
}

impl AppState {
    /// Creates a new `AppState` around the given repository.
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self { task_repository }
    }

    /// Returns the repository after making sure its schema exists.
    ///
    /// # Errors
    ///
    /// Propagates the failure of `ensure_schema`.
    pub async fn repository(&self) -> Result<&dyn TaskRepository, RepositoryError> {
        self.task_repository.ensure_schema().await?;
        Ok(self.task_repository.as_ref())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Human-readable status message.
    pub message: String,
}

/// Health check endpoint.
///
/// Reports liveness only. The store is not consulted, so this stays
/// green while the database is unreachable.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryTaskRepository;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "OK");
        assert_eq!(response.message, "Server is running");
    }

    #[rstest]
    #[tokio::test]
    async fn test_repository_ensures_schema() {
        let state = AppState::new(Arc::new(InMemoryTaskRepository::new()));
        let repository = state.repository().await.unwrap();
        assert!(repository.list().await.unwrap().is_empty());
    }
}
