//! Revision log entries: immutable, numbered snapshots of task mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{TaskId, UserId};
use super::task::TaskDetails;

/// Kind of mutation a revision records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Create,
    Update,
    Delete,
}

/// One row of the append-only revision log.
///
/// Invariants (the store is the authority, see `ports::task_store`):
/// - `revision` numbers for a task id are contiguous from 1, no gaps or
///   duplicates; (task_id, revision) is unique.
/// - Rows are written exactly once per mutation and never updated or deleted.
/// - The highest-numbered row reflects the most recent mutation, including
///   DELETE: a DELETE row snapshots the details as they were just before the
///   task left current storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRevision {
    pub task_id: TaskId,
    pub revision: u32,

    /// Snapshot of the task details as of this mutation.
    pub details: TaskDetails,

    pub modified_by: UserId,
    pub modified_date: DateTime<Utc>,
    pub update_type: UpdateType,
}
