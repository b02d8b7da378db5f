//! Repository trait for the task store.
//!
//! Every backend (SQLite, `PostgreSQL`, in-memory) implements
//! [`TaskRepository`] with identical semantics so the HTTP layer can hold an
//! `Arc<dyn TaskRepository>` and stay unaware of the engine behind it.

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::domain::{NewTask, Priority, Task, TaskId, TaskPatch};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No row matched the given identifier.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The write would break a table constraint (duplicate id, empty title).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A connection to the store could not be established.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be decoded into a task.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RepositoryError {
    /// Classifies a failure to obtain a connection.
    ///
    /// Whatever the driver reports while connecting means the store cannot
    /// be reached.
    #[must_use]
    pub fn unavailable(error: &sqlx::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }

    pub(crate) fn not_found(task_id: &TaskId) -> Self {
        Self::NotFound(format!("Task {task_id}"))
    }

    pub(crate) fn empty_title() -> Self {
        Self::ConstraintViolation("title must not be empty".to_string())
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(database_error) => match database_error.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::ForeignKeyViolation => {
                    Self::ConstraintViolation(database_error.message().to_string())
                }
                _ => Self::DatabaseError(database_error.to_string()),
            },
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::unavailable(&error),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::SerializationError(error.to_string())
            }
            _ => Self::DatabaseError(error.to_string()),
        }
    }
}

/// Parses a stored priority column.
pub(crate) fn decode_priority(value: &str) -> Result<Priority, RepositoryError> {
    value
        .parse()
        .map_err(|error: crate::domain::UnknownPriority| {
            RepositoryError::SerializationError(error.to_string())
        })
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task entities.
///
/// Implementations must be safe to share across request handlers; any
/// serialization of concurrent writes is left to the underlying store.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Creates the `tasks` table if it does not exist.
    ///
    /// Idempotent. After the first success it returns immediately without
    /// touching the store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StoreUnavailable` if no connection can be
    /// established.
    async fn ensure_schema(&self) -> Result<(), RepositoryError>;

    /// Inserts a new row. The store stamps `created_at` and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ConstraintViolation` if the id already
    /// exists or the title is empty.
    async fn insert(&self, task: &NewTask) -> Result<(), RepositoryError>;

    /// Lists every task, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Finds a task by its ID.
    ///
    /// Returns `Ok(Some(task))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError>;

    /// Applies a coalesce update and returns the fresh row.
    ///
    /// `updated_at` is refreshed even when the patch is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has the given id.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError>;

    /// Deletes a task by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was removed.
    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError>;

    /// Releases pooled connections. Called once on shutdown.
    async fn close(&self) {}
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_repository_error_display() {
        let error = RepositoryError::NotFound("task-123".to_string());
        assert_eq!(format!("{error}"), "Entity not found: task-123");

        let error = RepositoryError::StoreUnavailable("connection refused".to_string());
        assert_eq!(format!("{error}"), "Store unavailable: connection refused");

        let error = RepositoryError::DatabaseError("syntax error".to_string());
        assert_eq!(format!("{error}"), "Database error: syntax error");
    }

    #[rstest]
    fn test_sqlx_pool_errors_are_unavailable() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::PoolTimedOut),
            RepositoryError::StoreUnavailable(_)
        ));
        assert!(matches!(
            RepositoryError::from(sqlx::Error::PoolClosed),
            RepositoryError::StoreUnavailable(_)
        ));
    }

    #[rstest]
    fn test_sqlx_row_not_found_is_database_error() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::RowNotFound),
            RepositoryError::DatabaseError(_)
        ));
    }

    #[rstest]
    fn test_decode_priority() {
        assert_eq!(decode_priority("high"), Ok(Priority::High));
        assert!(matches!(
            decode_priority("urgent"),
            Err(RepositoryError::SerializationError(_))
        ));
    }
}
