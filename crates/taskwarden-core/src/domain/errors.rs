//! TaskError - コアの閉じたエラー分類
//!
//! # 設計原則
//! - 検出した時点で即座に返す（fail-fast、部分コミットなし）
//! - コア内で握りつぶさない（リトライもしない）
//! - transport 層が種類ごとにステータスへ写像できるよう、単一の sum type に
//!   必要なコンテキストを持たせる

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::ids::{TaskId, UserId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("task with id {0} not found")]
    TaskNotFound(TaskId),

    /// Distinct from `TaskNotFound` so callers can answer differently.
    /// `task_id` is absent when the denial happens before a task exists
    /// (e.g. on insert).
    #[error("user {username} is not authorized for this task")]
    NotAuthorized {
        task_id: Option<TaskId>,
        username: String,
    },

    #[error("task title must not be empty")]
    MissingTitle,

    #[error("task {field} exceeds the maximum length of {limit} characters")]
    FieldTooLong { field: &'static str, limit: usize },

    #[error("task can't be created/updated with due date {0} in the past")]
    DueDateInPast(DateTime<Utc>),

    #[error("task owner {0} does not exist")]
    OwnerDoesNotExist(UserId),

    /// Actor resolution failure at the directory, distinct from a task-level
    /// owner problem.
    #[error("no user found for username {0}")]
    UnknownUser(String),

    #[error("user {0} can't be added with role END_USER and without a manager with role MANAGER")]
    EndUserWithoutManager(String),

    #[error("username {0} is already taken")]
    DuplicateUsername(String),

    /// Persistence collaborator failure. The mutation did not apply.
    #[error("storage failure: {0}")]
    Store(String),
}
