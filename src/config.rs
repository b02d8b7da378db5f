//! Server process configuration.
//!
//! # Environment Variables
//!
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: bind port (default: `5001`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//! - `WORKER_THREADS`: Tokio worker threads (default: logical CPU count)
//!
//! Storage settings live in [`crate::infrastructure::RepositoryConfig`].

use std::env;
use std::str::FromStr;

/// Port used when `PORT` is unset or not a valid port number.
pub const DEFAULT_PORT: u16 = 5001;

/// Host used when `HOST` is unset.
pub const DEFAULT_HOST: &str = "0.0.0.0";

// =============================================================================
// Log Format
// =============================================================================

/// Output format of the tracing fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format '{other}'")),
        }
    }
}

// =============================================================================
// Server Config
// =============================================================================

/// Listener and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Malformed values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Reads the configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup("PORT")
            .and_then(|port| port.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let log_format = lookup("LOG_FORMAT")
            .and_then(|format| format.parse().ok())
            .unwrap_or_default();

        Self {
            host,
            port,
            log_format,
        }
    }

    /// Returns `host:port` for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Worker Threads
// =============================================================================

/// Result of parsing `WORKER_THREADS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerThreads {
    /// Explicit worker count, `None` for the runtime default.
    pub threads: Option<usize>,
    /// Message to print when the value was rejected or capped.
    pub warning: Option<String>,
}

/// Parses a `WORKER_THREADS` value.
///
/// Zero and non-numeric values fall back to the default with a warning.
/// Values above four times `available_parallelism` are capped.
#[must_use]
pub fn parse_worker_threads(value: Option<&str>, available_parallelism: usize) -> WorkerThreads {
    let Some(trimmed) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return WorkerThreads {
            threads: None,
            warning: None,
        };
    };

    match trimmed.parse::<usize>() {
        Ok(0) => WorkerThreads {
            threads: None,
            warning: Some(
                "Warning: WORKER_THREADS=0 is invalid (must be > 0), using default".to_string(),
            ),
        },
        Ok(threads) => {
            let max_threads = available_parallelism.saturating_mul(4);
            if threads > max_threads {
                WorkerThreads {
                    threads: Some(max_threads),
                    warning: Some(format!(
                        "Warning: WORKER_THREADS={threads} exceeds recommended limit ({max_threads}), capping to {max_threads}"
                    )),
                }
            } else {
                WorkerThreads {
                    threads: Some(threads),
                    warning: None,
                }
            }
        }
        Err(error) => WorkerThreads {
            threads: None,
            warning: Some(format!(
                "Warning: WORKER_THREADS='{trimmed}' is not a valid number ({error}), using default"
            )),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
