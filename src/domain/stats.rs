//! Aggregate counts over a task list.

use std::collections::BTreeMap;

use serde::Serialize;

use super::task::{DEFAULT_CATEGORY, Priority, Task};

/// Number of tasks per priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    /// Tasks at [`Priority::Low`].
    pub low: u64,
    /// Tasks at [`Priority::Medium`].
    pub medium: u64,
    /// Tasks at [`Priority::High`].
    pub high: u64,
}

impl PriorityCounts {
    const fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

/// Summary of a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    /// Number of tasks in the list.
    pub total: u64,
    /// Tasks marked completed.
    pub completed: u64,
    /// `total - completed`.
    pub pending: u64,
    /// `completed / total * 100`, or `0.0` for an empty list.
    pub completion_percentage: f64,
    /// Task counts per priority level.
    pub by_priority: PriorityCounts,
    /// Task counts per category, keyed by category name.
    pub by_category: BTreeMap<String, u64>,
    /// Category with the most tasks. Among tied categories the one first
    /// seen last in the input wins; an empty list yields
    /// [`DEFAULT_CATEGORY`].
    pub most_common_category: String,
}

impl TaskStats {
    /// Computes the summary. Pure function.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut by_priority = PriorityCounts::default();
        let mut by_category: BTreeMap<String, u64> = BTreeMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        let mut completed = 0_u64;

        for task in tasks {
            if task.completed {
                completed += 1;
            }
            by_priority.increment(task.priority);
            let count = by_category.entry(task.category.clone()).or_default();
            if *count == 0 {
                first_seen.push(&task.category);
            }
            *count += 1;
        }

        let total = tasks.len() as u64;
        let completion_percentage = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };

        // Walk categories in first-seen order; a later tie replaces the leader.
        let most_common_category = first_seen
            .iter()
            .filter_map(|category| by_category.get(*category).map(|&count| (*category, count)))
            .fold(None::<(&str, u64)>, |best, (category, count)| match best {
                Some((_, best_count)) if best_count > count => best,
                _ => Some((category, count)),
            })
            .map_or_else(|| DEFAULT_CATEGORY.to_string(), |(category, _)| category.to_string());

        Self {
            total,
            completed,
            pending: total - completed,
            completion_percentage,
            by_priority,
            by_category,
            most_common_category,
        }
    }
}
