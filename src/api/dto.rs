//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract.

use serde::{Deserialize, Deserializer, Serialize, de};

use super::error::ValidationError;
use crate::domain::{DEFAULT_CATEGORY, NewTask, Priority, Task, TaskId, TaskPatch};

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a new task.
///
/// `title` is optional at the serde level so that a missing title reaches
/// validation and produces the same 400 as a blank one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    /// Title of the task. Required and non-blank.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority level. Absent, `null` or blank defaults to medium.
    #[serde(default, deserialize_with = "deserialize_priority")]
    pub priority: Option<Priority>,
    /// Category (defaults to `general`).
    #[serde(default)]
    pub category: Option<String>,
}

impl CreateTaskRequest {
    /// Validates the request and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the title is missing or blank.
    pub fn into_new_task(self, task_id: TaskId) -> Result<NewTask, ValidationError> {
        let title = validate_title(self.title.as_deref())?;

        let category = self
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Ok(NewTask::new(task_id, title)
            .with_description(self.description.unwrap_or_default())
            .with_priority(self.priority.unwrap_or_default())
            .with_category(category))
    }
}

/// Request DTO for updating a task.
///
/// Absent and `null` fields both leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title. Not checked for emptiness.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New completion flag.
    #[serde(default)]
    pub completed: Option<bool>,
    /// New priority. Blank is treated as absent.
    #[serde(default, deserialize_with = "deserialize_priority")]
    pub priority: Option<Priority>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(request: UpdateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            completed: request.completed,
            priority: request.priority,
            category: request.category,
        }
    }
}

/// Response DTO for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID.
    pub id: String,
    /// Title of the task.
    pub title: String,
    /// Description of the task.
    pub description: String,
    /// Whether the task is completed.
    pub completed: bool,
    /// Priority level.
    pub priority: Priority,
    /// Category of the task.
    pub category: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.task_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            priority: task.priority,
            category: task.category.clone(),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

/// Response DTO for a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Confirmation message.
    pub message: String,
}

impl DeleteResponse {
    /// The confirmation returned after a task is removed.
    #[must_use]
    pub fn task_deleted() -> Self {
        Self {
            message: "Task deleted successfully".to_string(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a task title.
///
/// Whitespace is ignored for the emptiness check only; an accepted title
/// is returned exactly as supplied.
///
/// # Errors
///
/// Returns `ValidationError` with the message `Title is required`.
pub fn validate_title(title: Option<&str>) -> Result<String, ValidationError> {
    match title {
        Some(title) if !title.trim().is_empty() => Ok(title.to_string()),
        _ => Err(ValidationError::single("title", "Title is required")),
    }
}

/// Reads an optional priority where `null`, `""` and whitespace all mean
/// "not supplied". Any other unknown level is a deserialization error.
fn deserialize_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => {
            value.parse::<Priority>().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use proptest::prelude::*;
    use rstest::rstest;

    // -------------------------------------------------------------------------
    // CreateTaskRequest Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_create_request_applies_defaults() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();
        let task_id = TaskId::generate();

        let new_task = request.into_new_task(task_id.clone()).unwrap();

        assert_eq!(new_task.task_id, task_id);
        assert_eq!(new_task.title, "Buy milk");
        assert_eq!(new_task.description, "");
        assert_eq!(new_task.priority, Priority::Medium);
        assert_eq!(new_task.category, "general");
    }

    #[rstest]
    fn test_create_request_keeps_supplied_fields() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "  Ship release ", "description": "v2", "priority": "high", "category": "work"}"#,
        )
        .unwrap();

        let new_task = request.into_new_task(TaskId::generate()).unwrap();

        assert_eq!(new_task.title, "  Ship release ");
        assert_eq!(new_task.description, "v2");
        assert_eq!(new_task.priority, Priority::High);
        assert_eq!(new_task.category, "work");
    }

    #[rstest]
    #[case(r#"{}"#)]
    #[case(r#"{"title": null}"#)]
    #[case(r#"{"title": ""}"#)]
    #[case(r#"{"title": "   "}"#)]
    fn test_create_request_requires_title(#[case] body: &str) {
        let request: CreateTaskRequest = serde_json::from_str(body).unwrap();

        let error = request.into_new_task(TaskId::generate()).unwrap_err();
        assert_eq!(error.errors[0].field, "title");
        assert_eq!(error.errors[0].message, "Title is required");
    }

    #[rstest]
    #[case(r#"{"title": "t", "category": ""}"#)]
    #[case(r#"{"title": "t", "category": null}"#)]
    fn test_create_request_blank_category_falls_back(#[case] body: &str) {
        let request: CreateTaskRequest = serde_json::from_str(body).unwrap();
        let new_task = request.into_new_task(TaskId::generate()).unwrap();
        assert_eq!(new_task.category, DEFAULT_CATEGORY);
    }

    #[rstest]
    #[case(r#"{"title": "t", "priority": ""}"#)]
    #[case(r#"{"title": "t", "priority": "  "}"#)]
    #[case(r#"{"title": "t", "priority": null}"#)]
    fn test_create_request_blank_priority_falls_back(#[case] body: &str) {
        let request: CreateTaskRequest = serde_json::from_str(body).unwrap();
        let new_task = request.into_new_task(TaskId::generate()).unwrap();
        assert_eq!(new_task.priority, Priority::Medium);
    }

    #[rstest]
    #[case("urgent")]
    #[case("High")]
    fn test_create_request_rejects_unknown_priority(#[case] priority: &str) {
        let body = serde_json::json!({"title": "t", "priority": priority});
        let error = serde_json::from_value::<CreateTaskRequest>(body).unwrap_err();
        assert!(error.to_string().contains("Unknown priority"));
    }

    // -------------------------------------------------------------------------
    // UpdateTaskRequest Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_update_request_into_patch() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"completed": true, "title": null}"#).unwrap();

        let patch = TaskPatch::from(request);

        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.title, None);
        assert_eq!(patch.priority, None);
    }

    #[rstest]
    fn test_update_request_blank_priority_leaves_priority() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"priority": "", "completed": true}"#).unwrap();
        assert_eq!(TaskPatch::from(request).priority, None);
    }

    #[rstest]
    fn test_update_request_parses_priority() {
        let request: UpdateTaskRequest = serde_json::from_str(r#"{"priority": "low"}"#).unwrap();
        assert_eq!(TaskPatch::from(request).priority, Some(Priority::Low));
    }

    #[rstest]
    fn test_update_request_allows_empty_title() {
        let request: UpdateTaskRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert_eq!(TaskPatch::from(request).title, Some(String::new()));
    }

    // -------------------------------------------------------------------------
    // TaskResponse Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_response_from_task() {
        let now = Timestamp::now();
        let task = NewTask::new(TaskId::generate(), "Buy milk")
            .with_priority(Priority::Low)
            .into_task(now.clone());

        let response = TaskResponse::from(&task);

        assert_eq!(response.id, task.task_id.to_string());
        assert_eq!(response.priority, Priority::Low);
        assert_eq!(response.created_at, now.to_rfc3339());
        assert_eq!(response.created_at, response.updated_at);
    }

    #[rstest]
    fn test_task_response_json_shape() {
        let task = NewTask::new(TaskId::generate(), "Buy milk").into_task(Timestamp::now());
        let json = serde_json::to_value(TaskResponse::from(task)).unwrap();

        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "category",
                "completed",
                "created_at",
                "description",
                "id",
                "priority",
                "title",
                "updated_at"
            ]
        );
        assert_eq!(json["priority"], "medium");
    }

    #[rstest]
    fn test_delete_response_message() {
        assert_eq!(
            serde_json::to_value(DeleteResponse::task_deleted()).unwrap(),
            serde_json::json!({"message": "Task deleted successfully"})
        );
    }

    // -------------------------------------------------------------------------
    // Property Tests
    // -------------------------------------------------------------------------

    proptest! {
        /// Whitespace-only titles are always rejected.
        #[test]
        fn blank_titles_are_rejected(title in "[ \t\n\r]{0,16}") {
            prop_assert!(validate_title(Some(&title)).is_err());
        }

        /// Titles with visible content are accepted byte for byte.
        #[test]
        fn padded_titles_are_kept_verbatim(
            padding in "[ \t]{0,4}",
            core in "[A-Za-z0-9][A-Za-z0-9 ]{0,30}[A-Za-z0-9]",
        ) {
            let title = format!("{padding}{core}{padding}");
            prop_assert_eq!(validate_title(Some(&title)), Ok(title.clone()));
        }
    }
}
