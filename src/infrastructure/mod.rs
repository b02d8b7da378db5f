//! Infrastructure module for the task store.
//!
//! This module contains the repository trait, its SQLite, `PostgreSQL` and
//! in-memory implementations, and the factory that picks one at startup.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use factory::{
    ConfigurationError, DEFAULT_SQLITE_URL, FactoryError, RepositoryConfig,
    RepositoryConfigBuilder, RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use repository::{RepositoryError, TaskRepository};
pub use sqlite::SqliteTaskRepository;
