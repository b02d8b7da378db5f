//! SQLite repository implementation.
//!
//! The default backend for a standalone server: a single database file next
//! to the process, created on first use.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS tasks (
//!     id TEXT PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed BOOLEAN NOT NULL DEFAULT 0,
//!     priority TEXT NOT NULL DEFAULT 'medium',
//!     category TEXT NOT NULL DEFAULT 'general',
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```
//!
//! Timestamps are fixed-width RFC 3339 strings with microsecond precision,
//! so `ORDER BY created_at` and `MAX(?, created_at)` compare chronologically.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::OnceCell;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::repository::decode_priority;
use crate::infrastructure::{RepositoryError, TaskRepository};

const CREATE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT 0,
    priority TEXT NOT NULL DEFAULT 'medium',
    category TEXT NOT NULL DEFAULT 'general',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at)";

const SELECT_COLUMNS: &str =
    "id, title, description, completed, priority, category, created_at, updated_at";

/// Row shape as stored by SQLite.
#[derive(Debug, sqlx::FromRow)]
struct SqliteTaskRow {
    id: String,
    title: String,
    description: String,
    completed: bool,
    priority: String,
    category: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteTaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: SqliteTaskRow) -> Result<Self, Self::Error> {
        let serialization = |error: &dyn std::fmt::Display| {
            RepositoryError::SerializationError(error.to_string())
        };

        Ok(Self {
            task_id: row.id.parse().map_err(|error| serialization(&error))?,
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority: decode_priority(&row.priority)?,
            category: row.category,
            created_at: Timestamp::parse_rfc3339(&row.created_at)
                .map_err(|error| serialization(&error))?,
            updated_at: Timestamp::parse_rfc3339(&row.updated_at)
                .map_err(|error| serialization(&error))?,
        })
    }
}

/// SQLite implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let repository = SqliteTaskRepository::connect_lazy("sqlite://tasks.db")?;
/// repository.ensure_schema().await?;
/// repository.insert(&NewTask::new(TaskId::generate(), "My Task")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    /// Connection pool for SQLite.
    pool: SqlitePool,
    /// Set once the schema has been created in this process.
    schema: Arc<OnceCell<()>>,
}

impl SqliteTaskRepository {
    /// Creates a repository over an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Creates a repository whose pool opens connections on first use.
    ///
    /// The database file is created if it does not exist. In-memory URLs
    /// are pinned to a single long-lived connection so the data survives
    /// between queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StoreUnavailable` if the URL cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|error| RepositoryError::unavailable(&error))?
            .create_if_missing(true);

        let pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        let pool_options = if database_url.contains(":memory:") {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(10)
        };

        Ok(Self::new(pool_options.connect_lazy_with(options)))
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        self.schema
            .get_or_try_init(|| async {
                let mut connection = self
                    .pool
                    .acquire()
                    .await
                    .map_err(|error| RepositoryError::unavailable(&error))?;

                sqlx::query(CREATE_TASKS_TABLE)
                    .execute(&mut *connection)
                    .await?;
                sqlx::query(CREATE_CREATED_AT_INDEX)
                    .execute(&mut *connection)
                    .await?;

                tracing::info!("SQLite tasks schema ready");
                Ok::<(), RepositoryError>(())
            })
            .await
            .map(|_| ())
    }

    async fn insert(&self, task: &NewTask) -> Result<(), RepositoryError> {
        if !task.has_title() {
            return Err(RepositoryError::empty_title());
        }

        let now = Timestamp::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tasks (id, title, description, priority, category, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.task_id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let rows: Vec<SqliteTaskRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM tasks ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let row: Option<SqliteTaskRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM tasks WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        let row: Option<SqliteTaskRow> = sqlx::query_as(&format!(
            "UPDATE tasks \
             SET title = COALESCE(?, title), \
                 description = COALESCE(?, description), \
                 completed = COALESCE(?, completed), \
                 priority = COALESCE(?, priority), \
                 category = COALESCE(?, category), \
                 updated_at = MAX(?, created_at) \
             WHERE id = ? \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.completed)
        .bind(patch.priority.map(|priority| priority.as_str()))
        .bind(patch.category.as_deref())
        .bind(Timestamp::now().to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::not_found(id))
            .and_then(Task::try_from)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(id));
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Tests
// =============================================================================
