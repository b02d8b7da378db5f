//! Common test helpers for integration tests.
//!
//! Builds routers over each repository backend and drives them with
//! `tower::ServiceExt::oneshot`.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{TestApp, send};
//! ```
//!
//! Each integration test file is its own crate, so helpers unused by one
//! file would otherwise warn.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use task_tracker::api::{self, AppState};
use task_tracker::domain::{NewTask, Task, TaskId, TaskPatch};
use task_tracker::infrastructure::{
    InMemoryTaskRepository, RepositoryError, SqliteTaskRepository, TaskRepository,
};

// =============================================================================
// Test Applications
// =============================================================================

/// Storage backends the HTTP suite runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    InMemory,
    Sqlite,
}

impl Backend {
    pub fn app(self) -> TestApp {
        match self {
            Self::InMemory => TestApp::in_memory(),
            Self::Sqlite => TestApp::sqlite(),
        }
    }
}

/// A router plus whatever must outlive it.
pub struct TestApp {
    pub router: Router,
    pub repository: Arc<dyn TaskRepository>,
    _directory: Option<TempDir>,
}

impl TestApp {
    fn from_repository(repository: Arc<dyn TaskRepository>, directory: Option<TempDir>) -> Self {
        Self {
            router: api::router(AppState::new(Arc::clone(&repository))),
            repository,
            _directory: directory,
        }
    }

    /// Application over the in-memory store.
    pub fn in_memory() -> Self {
        Self::from_repository(Arc::new(InMemoryTaskRepository::new()), None)
    }

    /// Application over a SQLite file in a fresh temporary directory.
    pub fn sqlite() -> Self {
        let directory = TempDir::new().unwrap();
        let url = format!(
            "sqlite://{}",
            directory.path().join("tasks.db").to_string_lossy()
        );
        let repository = SqliteTaskRepository::connect_lazy(&url).unwrap();
        Self::from_repository(Arc::new(repository), Some(directory))
    }

    /// Application whose store rejects every operation.
    pub fn unavailable() -> Self {
        Self::from_repository(Arc::new(UnavailableRepository), None)
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        send(&self.router, method, uri, body).await
    }

    /// Creates a task through the API and returns its JSON.
    pub async fn create(&self, body: Value) -> Value {
        let response = self.send(Method::POST, "/tasks", Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }

    /// Returns the number of tasks listed by the API.
    pub async fn count(&self) -> usize {
        let response = self.send(Method::GET, "/tasks", None).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body.as_array().map_or(0, Vec::len)
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` when the body is empty.
    pub body: Value,
}

/// Sends one request through a clone of the router.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    send_request(router, request).await
}

/// Sends a prebuilt request.
pub async fn send_request(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

// =============================================================================
// Failing Repository
// =============================================================================

/// Repository that behaves like a database that cannot be reached.
pub struct UnavailableRepository;

impl UnavailableRepository {
    fn error() -> RepositoryError {
        RepositoryError::StoreUnavailable("connection refused (os error 111)".to_string())
    }
}

#[async_trait]
impl TaskRepository for UnavailableRepository {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        Err(Self::error())
    }

    async fn insert(&self, _task: &NewTask) -> Result<(), RepositoryError> {
        Err(Self::error())
    }

    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        Err(Self::error())
    }

    async fn find_by_id(&self, _id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        Err(Self::error())
    }

    async fn update(&self, _id: &TaskId, _patch: &TaskPatch) -> Result<Task, RepositoryError> {
        Err(Self::error())
    }

    async fn delete(&self, _id: &TaskId) -> Result<(), RepositoryError> {
        Err(Self::error())
    }
}
