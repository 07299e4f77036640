//! In-memory task store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    SortOrder, TaskDetails, TaskError, TaskId, TaskQuery, TaskRecord, TaskRevision, UpdateType,
    UserId,
};
use crate::ports::{Clock, IdGenerator, TaskStore};

/// In-memory store state.
///
/// Design:
/// - `tasks` is the single source of truth for current rows.
/// - `revisions` is the append-only log, keyed by task id independent of
///   current-row existence (numbering continues after DELETE).
/// - Everything sits behind one async mutex, so "compute max revision, then
///   append" is serialized with respect to every other mutation — the
///   uniqueness of (task_id, revision) falls out of the critical section.
struct InMemoryTaskStoreState {
    tasks: HashMap<TaskId, TaskRecord>,
    revisions: HashMap<TaskId, Vec<TaskRevision>>,
}

impl InMemoryTaskStoreState {
    fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            revisions: HashMap::new(),
        }
    }

    fn next_revision(&self, id: TaskId) -> u32 {
        self.revisions
            .get(&id)
            .and_then(|revisions| revisions.iter().map(|r| r.revision).max())
            .unwrap_or(0)
            + 1
    }

    fn append_revision(
        &mut self,
        id: TaskId,
        details: TaskDetails,
        modified_by: UserId,
        modified_date: chrono::DateTime<chrono::Utc>,
        update_type: UpdateType,
    ) {
        let revision = self.next_revision(id);
        self.revisions.entry(id).or_default().push(TaskRevision {
            task_id: id,
            revision,
            details,
            modified_by,
            modified_date,
            update_type,
        });
        debug!(task_id = %id, revision, ?update_type, "revision appended");
    }
}

/// In-memory `TaskStore` (development and tests).
pub struct InMemoryTaskStore {
    state: Mutex<InMemoryTaskStoreState>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(InMemoryTaskStoreState::new()),
            ids,
            clock,
        }
    }

    /// Observability hook: total number of revision rows across all tasks.
    pub async fn revision_count(&self) -> usize {
        let state = self.state.lock().await;
        state.revisions.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(
        &self,
        modified_by: UserId,
        details: TaskDetails,
    ) -> Result<TaskId, TaskError> {
        let mut state = self.state.lock().await;

        let id = self.ids.generate_task_id();
        state.tasks.insert(
            id,
            TaskRecord {
                task_id: id,
                details: details.clone(),
            },
        );
        state.append_revision(id, details, modified_by, self.clock.now(), UpdateType::Create);
        Ok(id)
    }

    async fn update_task(
        &self,
        modified_by: UserId,
        id: TaskId,
        details: TaskDetails,
    ) -> Result<(), TaskError> {
        let mut state = self.state.lock().await;

        let Some(record) = state.tasks.get_mut(&id) else {
            return Err(TaskError::TaskNotFound(id));
        };
        record.details = details.clone();

        state.append_revision(id, details, modified_by, self.clock.now(), UpdateType::Update);
        Ok(())
    }

    async fn delete_task(&self, modified_by: UserId, id: TaskId) -> Result<(), TaskError> {
        let mut state = self.state.lock().await;

        let Some(record) = state.tasks.remove(&id) else {
            return Err(TaskError::TaskNotFound(id));
        };

        // Snapshot the details as they were just before removal.
        state.append_revision(
            id,
            record.details,
            modified_by,
            self.clock.now(),
            UpdateType::Delete,
        );
        Ok(())
    }

    async fn get_task_by_id(&self, id: TaskId) -> Result<Option<TaskRecord>, TaskError> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, TaskError> {
        let state = self.state.lock().await;

        let mut tasks: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|record| query.matches(&record.details))
            .cloned()
            .collect();

        match query.order {
            Some(SortOrder::Asc) => tasks.sort_by_key(|record| record.details.due_date),
            Some(SortOrder::Desc) => {
                tasks.sort_by_key(|record| std::cmp::Reverse(record.details.due_date))
            }
            None => {}
        }

        Ok(tasks)
    }

    async fn get_task_history(&self, id: TaskId) -> Result<Vec<TaskRevision>, TaskError> {
        let state = self.state.lock().await;

        let mut history = state.revisions.get(&id).cloned().unwrap_or_default();
        history.sort_by_key(|revision| revision.revision);
        Ok(history)
    }
}
