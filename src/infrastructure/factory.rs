//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `sqlite` (default) | `postgres` | `in_memory`
//! - `DATABASE_URL`: connection URL. Defaults to `sqlite://tasks.db` for
//!   SQLite, required when `STORAGE_MODE=postgres`, ignored for `in_memory`.
//!
//! # Example
//!
//! ```ignore
//! use infrastructure::factory::{RepositoryConfig, RepositoryFactory};
//!
//! let config = RepositoryConfig::from_env()?;
//! let repository = RepositoryFactory::new(config).create()?;
//! repository.ensure_schema().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::{
    InMemoryTaskRepository, PostgresTaskRepository, RepositoryError, SqliteTaskRepository,
    TaskRepository,
};

/// Database URL used when `STORAGE_MODE=sqlite` and none is configured.
pub const DEFAULT_SQLITE_URL: &str = "sqlite://tasks.db";

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage engine backing the task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Embedded SQLite file.
    #[default]
    Sqlite,
    /// `PostgreSQL` server.
    Postgres,
    /// Process memory. Suitable for testing and development.
    InMemory,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
///
/// Use [`RepositoryConfigBuilder`] for a fluent API to construct this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Storage engine.
    pub storage_mode: StorageMode,
    /// Connection URL. `None` selects the engine default where one exists.
    pub database_url: Option<String>,
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(|key| env::var(key))
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`RepositoryConfig::from_env`].
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let storage_mode = match lookup("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        // Empty or whitespace-only counts as unset
        let database_url = lookup("DATABASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let config = Self {
            storage_mode,
            database_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if `PostgreSQL` is
    /// selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }

    /// Returns the URL the factory will connect to.
    #[must_use]
    pub fn effective_database_url(&self) -> Option<&str> {
        match self.storage_mode {
            StorageMode::Sqlite => Some(
                self.database_url
                    .as_deref()
                    .unwrap_or(DEFAULT_SQLITE_URL),
            ),
            StorageMode::Postgres => self.database_url.as_deref(),
            StorageMode::InMemory => None,
        }
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/tasks")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while reading repository configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'sqlite', 'postgres' or 'in_memory'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The pool could not be built from the configured URL.
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] RepositoryError),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating the task repository selected by configuration.
///
/// SQL pools are created lazily, so `create` succeeds even while the
/// database is down. The first store operation reports the outage.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the task repository.
    ///
    /// Must be called from within a Tokio runtime when a SQL backend is
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the configuration is invalid or the
    /// database URL cannot be parsed.
    pub fn create(&self) -> Result<Arc<dyn TaskRepository>, FactoryError> {
        self.config.validate()?;

        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryTaskRepository::new())),
            StorageMode::Sqlite => {
                let url = self
                    .config
                    .effective_database_url()
                    .unwrap_or(DEFAULT_SQLITE_URL);
                Ok(Arc::new(SqliteTaskRepository::connect_lazy(url)?))
            }
            StorageMode::Postgres => {
                let url = self
                    .config
                    .effective_database_url()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?;
                Ok(Arc::new(PostgresTaskRepository::connect_lazy(url)?))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
