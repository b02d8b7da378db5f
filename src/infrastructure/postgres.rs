//! `PostgreSQL` repository implementation.
//!
//! Uses `sqlx` with a lazily connecting pool: constructing the repository
//! never touches the network, the first query opens the first connection.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS tasks (
//!     id UUID PRIMARY KEY,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     priority VARCHAR(32) NOT NULL DEFAULT 'medium',
//!     category VARCHAR(64) NOT NULL DEFAULT 'general',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::repository::decode_priority;
use crate::infrastructure::{RepositoryError, TaskRepository};

const CREATE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    priority VARCHAR(32) NOT NULL DEFAULT 'medium',
    category VARCHAR(64) NOT NULL DEFAULT 'general',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at DESC)";

const SELECT_COLUMNS: &str =
    "id, title, description, completed, priority, category, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PostgresTaskRow {
    id: Uuid,
    title: String,
    description: String,
    completed: bool,
    priority: String,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostgresTaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: PostgresTaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            task_id: TaskId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority: decode_priority(&row.priority)?,
            category: row.category,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::postgres::PostgresTaskRepository;
///
/// let repository = PostgresTaskRepository::connect_lazy("postgres://localhost/tasks")?;
/// repository.ensure_schema().await?;
/// let tasks = repository.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    /// Connection pool for `PostgreSQL`.
    pool: PgPool,
    schema: Arc<OnceCell<()>>,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Creates a repository whose pool connects on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StoreUnavailable` if the URL cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, RepositoryError> {
        PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)
            .map(Self::new)
            .map_err(|error| RepositoryError::unavailable(&error))
    }

    /// Returns the underlying connection pool.
    ///
    /// Useful for running custom queries or sharing the pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
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

                tracing::info!("PostgreSQL tasks schema ready");
                Ok::<(), RepositoryError>(())
            })
            .await
            .map(|_| ())
    }

    async fn insert(&self, task: &NewTask) -> Result<(), RepositoryError> {
        if !task.has_title() {
            return Err(RepositoryError::empty_title());
        }

        let now = *Timestamp::now().as_datetime();
        sqlx::query(
            "INSERT INTO tasks (id, title, description, priority, category, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(task.task_id.as_uuid())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let rows: Vec<PostgresTaskRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let row: Option<PostgresTaskRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        let row: Option<PostgresTaskRow> = sqlx::query_as(&format!(
            "UPDATE tasks \
             SET title = COALESCE($1, title), \
                 description = COALESCE($2, description), \
                 completed = COALESCE($3, completed), \
                 priority = COALESCE($4, priority), \
                 category = COALESCE($5, category), \
                 updated_at = GREATEST($6, created_at) \
             WHERE id = $7 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.completed)
        .bind(patch.priority.map(|priority| priority.as_str()))
        .bind(patch.category.as_deref())
        .bind(*Timestamp::now().as_datetime())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::not_found(id))
            .and_then(Task::try_from)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
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
