//! Query filters for listing tasks.

use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::task::{TaskDetails, TaskSeverity, TaskStatus};

/// Sort direction for the due-date ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Optional filters for a task listing. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub severity: Option<TaskSeverity>,

    /// Matches tasks assigned to exactly this owner; unowned tasks do not
    /// match an owner filter.
    #[serde(default)]
    pub owner: Option<UserId>,

    /// Due-date ordering of the result, if any.
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl TaskQuery {
    /// Does `details` satisfy every filter set on this query?
    pub fn matches(&self, details: &TaskDetails) -> bool {
        self.status.is_none_or(|status| details.status == status)
            && self.severity.is_none_or(|severity| details.severity == severity)
            && self.owner.is_none_or(|owner| details.owner == Some(owner))
    }
}
