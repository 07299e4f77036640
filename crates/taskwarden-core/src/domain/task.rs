//! Task model: the mutable payload and the current record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{TaskId, UserId};

/// Progress state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSeverity {
    Low,
    High,
    Urgent,
}

/// The mutable payload of a task.
///
/// Updates replace this wholesale (no field-level patching), so a revision
/// snapshot is always a complete `TaskDetails`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetails {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: TaskStatus,
    pub severity: TaskSeverity,

    /// Current assignee, or none. Unowned tasks are open to any actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,

    pub due_date: DateTime<Utc>,
}

impl TaskDetails {
    /// Convenience constructor for the common "title + dates" case.
    pub fn new(
        title: impl Into<String>,
        status: TaskStatus,
        severity: TaskSeverity,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            status,
            severity,
            owner: None,
            due_date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// A task as currently stored: immutable id + exactly one current payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub details: TaskDetails,
}
