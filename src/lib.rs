//! Task Tracker API
//!
//! A small REST service that stores tasks in a single `tasks` table and
//! exposes create, read, update and delete operations over HTTP.
//!
//! - [`domain`]: the task entity and its value objects
//! - [`infrastructure`]: the task store and its SQLite, `PostgreSQL` and
//!   in-memory backends
//! - [`api`]: axum handlers, DTOs and the error boundary
//! - [`config`]: listener and logging settings

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
