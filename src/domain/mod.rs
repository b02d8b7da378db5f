//! Domain module for task tracking.
//!
//! This module contains the task entity, its value objects, and the
//! pure aggregations computed over task lists.

pub mod stats;
pub mod task;

pub use stats::{PriorityCounts, TaskStats};
pub use task::{
    DEFAULT_CATEGORY, NewTask, Priority, Task, TaskId, TaskPatch, Timestamp, UnknownPriority,
};
