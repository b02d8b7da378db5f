//! Task domain model.
//!
//! This module contains the single entity of the system, its value objects,
//! and the two payloads that mutate it: [`NewTask`] for inserts and
//! [`TaskPatch`] for coalesce-style updates.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Category assigned to tasks created without one.
pub const DEFAULT_CATEGORY: &str = "general";

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// This is a newtype wrapper around UUID to provide type safety.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `TaskId` with a randomly generated UUID (v4).
    ///
    /// **Note**: This is an impure function (side effect: random number generation).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
///
/// Timestamps carry microsecond precision, the finest resolution every
/// backing store preserves, so a value survives a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`, truncated to microseconds.
    #[must_use]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.trunc_subsecs(6))
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Parses an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns `chrono::ParseError` if the string is not valid RFC 3339.
    pub fn parse_rfc3339(value: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(value)
            .map(|datetime| Self::from_datetime(datetime.with_timezone(&Utc)))
    }

    /// Formats as fixed-width RFC 3339 (`2024-01-02T03:04:05.000006Z`).
    ///
    /// The fixed width makes lexical order identical to chronological order.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.to_rfc3339())
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The priority level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the storage representation, identical to the JSON one.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a stored priority is not one of the known levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown priority: '{0}'. Expected 'low', 'medium' or 'high'")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownPriority(value.to_string())),
        }
    }
}

// =============================================================================
// Task Entity
// =============================================================================

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, immutable once assigned.
    pub task_id: TaskId,
    /// Title of the task.
    pub title: String,
    /// Free-form description, empty when none was supplied.
    pub description: String,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Priority level.
    pub priority: Priority,
    /// Free-form category.
    pub category: String,
    /// Creation time, never changes.
    pub created_at: Timestamp,
    /// Time of the last successful update.
    pub updated_at: Timestamp,
}

// =============================================================================
// Insert Payload
// =============================================================================

/// A task that has not been persisted yet.
///
/// Every optional field already holds its default, so a store never has to
/// invent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Caller-supplied identifier.
    pub task_id: TaskId,
    /// Title of the task.
    pub title: String,
    /// Description (defaults to empty).
    pub description: String,
    /// Priority (defaults to medium).
    pub priority: Priority,
    /// Category (defaults to [`DEFAULT_CATEGORY`]).
    pub category: String,
}

impl NewTask {
    /// Creates a new task payload with default optional fields.
    #[must_use]
    pub fn new(task_id: TaskId, title: impl Into<String>) -> Self {
        Self {
            task_id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Returns a new payload with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    /// Returns a new payload with the given priority.
    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    /// Returns a new payload with the given category.
    #[must_use]
    pub fn with_category(self, category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..self
        }
    }

    /// Returns true if the payload satisfies the stored-row invariants.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// Materializes the stored task, stamping both timestamps with `now`.
    #[must_use]
    pub fn into_task(self, now: Timestamp) -> Task {
        Task {
            task_id: self.task_id,
            title: self.title,
            description: self.description,
            completed: false,
            priority: self.priority,
            category: self.category,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

// =============================================================================
// Update Payload
// =============================================================================

/// A partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title. Not re-validated: an empty title is accepted.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement completion flag.
    pub completed: Option<bool>,
    /// Replacement priority.
    pub priority: Option<Priority>,
    /// Replacement category.
    pub category: Option<String>,
}

impl TaskPatch {
    /// Applies the patch with coalesce semantics.
    ///
    /// `updated_at` is refreshed even for an empty patch and never moves
    /// before `created_at`.
    #[must_use]
    pub fn apply(self, task: Task, now: Timestamp) -> Task {
        let updated_at = now.max(task.created_at.clone());
        Task {
            title: self.title.unwrap_or(task.title),
            description: self.description.unwrap_or(task.description),
            completed: self.completed.unwrap_or(task.completed),
            priority: self.priority.unwrap_or(task.priority),
            category: self.category.unwrap_or(task.category),
            updated_at,
            ..task
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn fixed_timestamp(second: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap())
    }

    #[rstest]
    fn test_task_id_parse_roundtrip() {
        let task_id = TaskId::generate();
        let parsed: TaskId = task_id.to_string().parse().unwrap();
        assert_eq!(parsed, task_id);
    }

    #[rstest]
    fn test_task_id_parse_invalid() {
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[rstest]
    fn test_task_id_generate_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[rstest]
    #[case("low", Priority::Low)]
    #[case("medium", Priority::Medium)]
    #[case("high", Priority::High)]
    fn test_priority_from_str(#[case] input: &str, #[case] expected: Priority) {
        assert_eq!(input.parse::<Priority>().unwrap(), expected);
        assert_eq!(expected.as_str(), input);
    }

    #[rstest]
    #[case("critical")]
    #[case("HIGH")]
    #[case("")]
    fn test_priority_from_str_invalid(#[case] input: &str) {
        let error = input.parse::<Priority>().unwrap_err();
        assert_eq!(error, UnknownPriority(input.to_string()));
    }

    #[rstest]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[rstest]
    fn test_priority_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[rstest]
    fn test_timestamp_fixed_width_format() {
        let timestamp = fixed_timestamp(5);
        assert_eq!(timestamp.to_rfc3339(), "2024-05-01T12:00:05.000000Z");
        assert_eq!(
            Timestamp::parse_rfc3339(&timestamp.to_rfc3339()).unwrap(),
            timestamp
        );
    }

    #[rstest]
    fn test_timestamp_truncates_to_microseconds() {
        let datetime = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::nanoseconds(1_234_567))
            .unwrap();
        let timestamp = Timestamp::from_datetime(datetime);
        assert_eq!(timestamp.to_rfc3339(), "2024-05-01T12:00:00.001234Z");
    }

    #[rstest]
    fn test_new_task_defaults() {
        let task = NewTask::new(TaskId::generate(), "Buy milk").into_task(fixed_timestamp(0));

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[rstest]
    fn test_new_task_builders() {
        let task = NewTask::new(TaskId::generate(), "Write report")
            .with_description("quarterly")
            .with_priority(Priority::High)
            .with_category("work");

        assert_eq!(task.description, "quarterly");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, "work");
        assert!(task.has_title());
        assert!(!NewTask::new(TaskId::generate(), "").has_title());
    }

    #[rstest]
    fn test_patch_completed_only_changes_completed_and_updated_at() {
        let original = NewTask::new(TaskId::generate(), "Buy milk")
            .with_category("home")
            .into_task(fixed_timestamp(0));
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };

        let updated = patch.apply(original.clone(), fixed_timestamp(1));

        assert!(updated.completed);
        assert_eq!(updated.updated_at, fixed_timestamp(1));
        assert_eq!(
            Task {
                completed: false,
                updated_at: original.updated_at.clone(),
                ..updated
            },
            original
        );
    }

    #[rstest]
    fn test_patch_empty_still_refreshes_updated_at() {
        let original = NewTask::new(TaskId::generate(), "Buy milk").into_task(fixed_timestamp(0));
        let updated = TaskPatch::default().apply(original.clone(), fixed_timestamp(9));

        assert_eq!(updated.title, original.title);
        assert_eq!(updated.updated_at, fixed_timestamp(9));
        assert_eq!(updated.created_at, original.created_at);
    }

    #[rstest]
    fn test_patch_accepts_empty_title() {
        let original = NewTask::new(TaskId::generate(), "Buy milk").into_task(fixed_timestamp(0));
        let patch = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };

        let updated = patch.apply(original, fixed_timestamp(1));
        assert_eq!(updated.title, "");
    }

    #[rstest]
    fn test_patch_never_moves_updated_at_before_created_at() {
        let original = NewTask::new(TaskId::generate(), "Buy milk").into_task(fixed_timestamp(30));

        let updated = TaskPatch::default().apply(original, fixed_timestamp(10));
        assert_eq!(updated.updated_at, fixed_timestamp(30));
    }
}
