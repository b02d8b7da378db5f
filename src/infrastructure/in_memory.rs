//! In-memory repository implementation.
//!
//! Suitable for tests and local development. Data lives only as long as the
//! process.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Same ordering and coalesce semantics as the SQL backends

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::{RepositoryError, TaskRepository};

/// A stored task together with its insertion order.
///
/// The sequence breaks ties between tasks created within the same
/// microsecond, mirroring `rowid` ordering in SQLite.
#[derive(Debug, Clone)]
struct StoredTask {
    sequence: u64,
    task: Task,
}

#[derive(Debug, Default)]
struct InMemoryState {
    tasks: HashMap<TaskId, StoredTask>,
    next_sequence: u64,
}

/// In-memory implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::in_memory::InMemoryTaskRepository;
///
/// let repository = InMemoryTaskRepository::new();
/// let task = NewTask::new(TaskId::generate(), "My Task");
///
/// repository.insert(&task).await?;
/// let found = repository.find_by_id(&task.task_id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn insert(&self, task: &NewTask) -> Result<(), RepositoryError> {
        if !task.has_title() {
            return Err(RepositoryError::empty_title());
        }

        let mut guard = self.state.write().await;
        if guard.tasks.contains_key(&task.task_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Task {} already exists",
                task.task_id
            )));
        }

        let sequence = guard.next_sequence;
        guard.next_sequence += 1;
        let stored = StoredTask {
            sequence,
            task: task.clone().into_task(Timestamp::now()),
        };
        guard.tasks.insert(task.task_id.clone(), stored);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.state.read().await;
        let mut stored: Vec<&StoredTask> = guard.tasks.values().collect();
        stored.sort_by(|left, right| {
            right
                .task
                .created_at
                .cmp(&left.task.created_at)
                .then_with(|| right.sequence.cmp(&left.sequence))
        });
        Ok(stored.into_iter().map(|entry| entry.task.clone()).collect())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let guard = self.state.read().await;
        Ok(guard.tasks.get(id).map(|entry| entry.task.clone()))
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        let mut guard = self.state.write().await;
        let entry = guard
            .tasks
            .get_mut(id)
            .ok_or_else(|| RepositoryError::not_found(id))?;

        entry.task = patch.clone().apply(entry.task.clone(), Timestamp::now());
        Ok(entry.task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let mut guard = self.state.write().await;
        guard
            .tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(id))
    }
}

// =============================================================================
// Tests
// =============================================================================
