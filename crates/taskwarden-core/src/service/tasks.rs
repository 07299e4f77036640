//! TaskService - 変更パイプライン
//!
//! すべての変更は validate → authorize → persist → revision の順に進む。
//! 永続化前に失敗した呼び出しは部分状態を残さない（孤児の行もリビジョンも
//! 生まれない）。リトライはしない。失敗はそのまま呼び出し側へ伝播する。

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    TaskDetails, TaskError, TaskId, TaskQuery, TaskRecord, TaskRevision, User,
};
use crate::ports::{Clock, TaskStore, UserDirectory};

use super::authorize::is_task_authorized;
use super::validate::validate_details;

/// The mutation pipeline and query surface for tasks.
///
/// Holds its collaborators behind ports; construction happens explicitly at
/// composition time (see `app::AppBuilder`), not through process-wide
/// singletons.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    /// Tasks matching `query` that `actor` is authorized for.
    ///
    /// Unauthorized items are dropped silently; dropping is not an error
    /// here, unlike single-task access.
    pub async fn get_tasks(
        &self,
        actor: &User,
        query: &TaskQuery,
    ) -> Result<Vec<TaskRecord>, TaskError> {
        let reports = self.directory.manager_to_reports_map().await?;
        let tasks = self.store.get_tasks(query).await?;
        Ok(tasks
            .into_iter()
            .filter(|task| is_task_authorized(&task.details, actor, &reports))
            .collect())
    }

    /// Fetch one task, failing with `TaskNotFound` if it is absent and
    /// `NotAuthorized` if it exists but the actor may not see it.
    pub async fn get_authorized_task(
        &self,
        actor: &User,
        id: TaskId,
    ) -> Result<TaskRecord, TaskError> {
        let Some(record) = self.store.get_task_by_id(id).await? else {
            return Err(TaskError::TaskNotFound(id));
        };
        self.authorize(&record.details, Some(id), actor).await?;
        Ok(record)
    }

    /// Full revision history, ascending by revision number.
    ///
    /// No authorization filtering is applied: any caller may inspect any
    /// task's history, and the history of an id that never existed is empty.
    pub async fn get_task_history(&self, id: TaskId) -> Result<Vec<TaskRevision>, TaskError> {
        self.store.get_task_history(id).await
    }

    /// Create a task. Revision 1 (CREATE) is recorded atomically with the row.
    pub async fn insert_task(
        &self,
        actor: &User,
        details: TaskDetails,
    ) -> Result<TaskId, TaskError> {
        validate_details(&details, self.directory.as_ref(), self.clock.now()).await?;
        self.authorize(&details, None, actor).await?;

        let id = self.store.insert_task(actor.user_id, details).await?;
        info!(task_id = %id, actor = %actor.username, "task created");
        Ok(id)
    }

    /// Replace a task's details wholesale.
    ///
    /// The actor must be authorized for the task as it is now, and — when the
    /// update moves ownership — for the task as it will be. Both checks run
    /// against the same actor; failing either rejects the whole update.
    pub async fn update_task(
        &self,
        actor: &User,
        id: TaskId,
        details: TaskDetails,
    ) -> Result<(), TaskError> {
        let Some(current) = self.store.get_task_by_id(id).await? else {
            return Err(TaskError::TaskNotFound(id));
        };
        self.authorize(&current.details, Some(id), actor).await?;

        validate_details(&details, self.directory.as_ref(), self.clock.now()).await?;
        if current.details.owner != details.owner {
            self.authorize(&details, Some(id), actor).await?;
        }

        self.store.update_task(actor.user_id, id, details).await?;
        info!(task_id = %id, actor = %actor.username, "task updated");
        Ok(())
    }

    /// Delete a task. The DELETE revision snapshots the state as of removal
    /// and continues the task's revision numbering.
    pub async fn delete_task(&self, actor: &User, id: TaskId) -> Result<(), TaskError> {
        let Some(current) = self.store.get_task_by_id(id).await? else {
            return Err(TaskError::TaskNotFound(id));
        };
        self.authorize(&current.details, Some(id), actor).await?;

        self.store.delete_task(actor.user_id, id).await?;
        info!(task_id = %id, actor = %actor.username, "task deleted");
        Ok(())
    }

    async fn authorize(
        &self,
        details: &TaskDetails,
        task_id: Option<TaskId>,
        actor: &User,
    ) -> Result<(), TaskError> {
        let reports = self.directory.manager_to_reports_map().await?;
        if !is_task_authorized(details, actor, &reports) {
            warn!(actor = %actor.username, ?task_id, "authorization denied");
            return Err(TaskError::NotAuthorized {
                task_id,
                username: actor.username.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUser, Role, SortOrder, TaskSeverity, TaskStatus, UpdateType, UserId};
    use crate::impls::{InMemoryTaskStore, InMemoryUserDirectory};
    use crate::ports::{FixedClock, IdGenerator, UlidGenerator};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ulid::Ulid;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    struct Env {
        service: TaskService,
        store: Arc<InMemoryTaskStore>,
        directory: Arc<InMemoryUserDirectory>,
    }

    fn env() -> Env {
        let clock = Arc::new(FixedClock::new(fixed_now()));
        let ids: Arc<dyn IdGenerator> =
            Arc::new(UlidGenerator::new(Arc::clone(&clock) as Arc<dyn Clock>));
        let directory = Arc::new(InMemoryUserDirectory::new(Arc::clone(&ids)));
        let store = Arc::new(InMemoryTaskStore::new(
            Arc::clone(&ids),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let service = TaskService::new(
            Arc::clone(&store) as Arc<dyn TaskStore>,
            Arc::clone(&directory) as Arc<dyn UserDirectory>,
            clock,
        );
        Env {
            service,
            store,
            directory,
        }
    }

    async fn seed_user(env: &Env, username: &str, role: Role, manager: Option<UserId>) -> User {
        env.directory
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash: "x".to_string(),
                email: format!("{username}@example.com"),
                role,
                manager,
            })
            .await
            .unwrap();
        env.directory
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap()
    }

    fn details(owner: Option<UserId>) -> TaskDetails {
        let mut details = TaskDetails::new(
            "write report",
            TaskStatus::NotStarted,
            TaskSeverity::Low,
            fixed_now() + Duration::days(1),
        );
        details.owner = owner;
        details
    }

    #[tokio::test]
    async fn manager_inserts_task_for_direct_report() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;

        let id = env
            .service
            .insert_task(&m1, details(Some(u1.user_id)))
            .await
            .expect("manager may create a task for a direct report");

        let history = env.service.get_task_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].revision, 1);
        assert_eq!(history[0].update_type, UpdateType::Create);
        assert_eq!(history[0].modified_by, m1.user_id);
    }

    #[tokio::test]
    async fn other_manager_cannot_read_the_task() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let m2 = seed_user(&env, "m2", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;

        let id = env
            .service
            .insert_task(&m1, details(Some(u1.user_id)))
            .await
            .unwrap();

        let err = env.service.get_authorized_task(&m2, id).await.unwrap_err();
        assert_eq!(
            err,
            TaskError::NotAuthorized {
                task_id: Some(id),
                username: "m2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn reading_a_missing_task_is_not_found() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let ghost = TaskId::from_ulid(Ulid::new());
        let err = env
            .service
            .get_authorized_task(&admin, ghost)
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::TaskNotFound(ghost));
    }

    #[tokio::test]
    async fn list_and_single_access_agree_on_authorization() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let m2 = seed_user(&env, "m2", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let u2 = seed_user(&env, "u2", Role::EndUser, Some(m2.user_id)).await;

        let admin = seed_user(&env, "root", Role::Admin, None).await;
        for owner in [None, Some(u1.user_id), Some(u2.user_id), Some(m2.user_id)] {
            env.service.insert_task(&admin, details(owner)).await.unwrap();
        }

        for actor in [&m1, &m2, &u1, &u2, &admin] {
            let listed = env
                .service
                .get_tasks(actor, &TaskQuery::default())
                .await
                .unwrap();

            // Exactly the listed subset is readable one-by-one; everything
            // else fails with NotAuthorized (all tasks exist here).
            let all = env
                .service
                .get_tasks(&admin, &TaskQuery::default())
                .await
                .unwrap();
            for task in &all {
                let single = env.service.get_authorized_task(actor, task.task_id).await;
                let in_list = listed.iter().any(|t| t.task_id == task.task_id);
                match single {
                    Ok(record) => {
                        assert!(in_list, "readable task missing from list");
                        assert_eq!(record.task_id, task.task_id);
                    }
                    Err(TaskError::NotAuthorized { .. }) => {
                        assert!(!in_list, "unauthorized task leaked into list")
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }
    }

    #[tokio::test]
    async fn update_three_times_then_delete_keeps_a_contiguous_history() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let id = env.service.insert_task(&admin, details(None)).await.unwrap();

        for status in [
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::InProgress,
        ] {
            env.service
                .update_task(&admin, id, details(None).with_status(status))
                .await
                .unwrap();
        }
        env.service.delete_task(&admin, id).await.unwrap();

        let history = env.service.get_task_history(id).await.unwrap();
        let revisions: Vec<u32> = history.iter().map(|r| r.revision).collect();
        assert_eq!(revisions, vec![1, 2, 3, 4, 5]);

        let kinds: Vec<UpdateType> = history.iter().map(|r| r.update_type).collect();
        assert_eq!(
            kinds,
            vec![
                UpdateType::Create,
                UpdateType::Update,
                UpdateType::Update,
                UpdateType::Update,
                UpdateType::Delete
            ]
        );

        // The DELETE row snapshots the state as of removal.
        assert_eq!(history[4].details.status, TaskStatus::InProgress);

        // The task itself is gone from current storage.
        let err = env.service.get_authorized_task(&admin, id).await.unwrap_err();
        assert_eq!(err, TaskError::TaskNotFound(id));
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_task_and_no_revision() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let mut past_due = details(None);
        past_due.due_date = fixed_now() - Duration::seconds(1);

        let err = env.service.insert_task(&admin, past_due).await.unwrap_err();
        assert!(matches!(err, TaskError::DueDateInPast(_)));

        let all = env
            .service
            .get_tasks(&admin, &TaskQuery::default())
            .await
            .unwrap();
        assert!(all.is_empty());
        assert!(env.store.revision_count().await == 0);
    }

    #[tokio::test]
    async fn failed_update_leaves_the_task_unchanged() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let outsider = seed_user(&env, "outsider", Role::EndUser, Some(m1.user_id)).await;

        let id = env
            .service
            .insert_task(&m1, details(Some(u1.user_id)))
            .await
            .unwrap();

        // outsider is authorized for nothing here
        let err = env
            .service
            .update_task(
                &outsider,
                id,
                details(Some(u1.user_id)).with_status(TaskStatus::Completed),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotAuthorized { .. }));

        let record = env.service.get_authorized_task(&m1, id).await.unwrap();
        assert_eq!(record.details.status, TaskStatus::NotStarted);

        let history = env.service.get_task_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].update_type, UpdateType::Create);
    }

    #[tokio::test]
    async fn insert_with_overlong_title_reports_the_field() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let mut bad = details(None);
        bad.title = "t".repeat(101);

        let err = env.service.insert_task(&admin, bad).await.unwrap_err();
        assert_eq!(
            err,
            TaskError::FieldTooLong {
                field: "title",
                limit: 100
            }
        );
    }

    #[tokio::test]
    async fn insert_validates_before_authorizing() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let stranger = seed_user(&env, "stranger", Role::EndUser, Some(m1.user_id)).await;

        // Invalid payload owned by someone the stranger can't act for: the
        // validation failure is the one surfaced.
        let mut bad = details(Some(u1.user_id));
        bad.title = String::new();

        let err = env.service.insert_task(&stranger, bad).await.unwrap_err();
        assert_eq!(err, TaskError::MissingTitle);
    }

    #[tokio::test]
    async fn update_authorizes_the_current_owner_before_validating() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let stranger = seed_user(&env, "stranger", Role::EndUser, Some(m1.user_id)).await;

        let id = env
            .service
            .insert_task(&m1, details(Some(u1.user_id)))
            .await
            .unwrap();

        // Both unauthorized and invalid: the authorization failure wins,
        // because the actor may not even touch the task as it is now.
        let mut bad = details(Some(u1.user_id));
        bad.title = String::new();

        let err = env.service.update_task(&stranger, id, bad).await.unwrap_err();
        assert!(matches!(err, TaskError::NotAuthorized { .. }));
    }

    #[tokio::test]
    async fn owner_change_needs_authorization_for_the_new_owner() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let m2 = seed_user(&env, "m2", Role::Manager, None).await;
        let u2 = seed_user(&env, "u2", Role::EndUser, Some(m2.user_id)).await;

        let id = env
            .service
            .insert_task(&m1, details(Some(u1.user_id)))
            .await
            .unwrap();

        // m1 is authorized for the current owner (u1) but not for the new
        // one (u2, another manager's report).
        let err = env
            .service
            .update_task(&m1, id, details(Some(u2.user_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotAuthorized { .. }));

        // Nothing moved.
        let record = env.service.get_authorized_task(&m1, id).await.unwrap();
        assert_eq!(record.details.owner, Some(u1.user_id));
    }

    #[tokio::test]
    async fn owner_change_needs_authorization_for_the_current_owner() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let m2 = seed_user(&env, "m2", Role::Manager, None).await;
        let u2 = seed_user(&env, "u2", Role::EndUser, Some(m2.user_id)).await;
        let admin = seed_user(&env, "root", Role::Admin, None).await;

        let id = env
            .service
            .insert_task(&admin, details(Some(u2.user_id)))
            .await
            .unwrap();

        // m1 would be authorized for the new owner (u1) but is not for the
        // current one (u2).
        let err = env
            .service
            .update_task(&m1, id, details(Some(u1.user_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotAuthorized { .. }));
    }

    #[tokio::test]
    async fn owner_keeping_update_checks_authorization_once() {
        let env = env();
        let u1 = seed_user(
            &env,
            "u1",
            Role::EndUser,
            Some(seed_user(&env, "m1", Role::Manager, None).await.user_id),
        )
        .await;

        let id = env
            .service
            .insert_task(&u1, details(Some(u1.user_id)))
            .await
            .unwrap();

        env.service
            .update_task(&u1, id, details(Some(u1.user_id)).with_status(TaskStatus::Completed))
            .await
            .expect("self-owned update with unchanged owner passes");
    }

    #[tokio::test]
    async fn updating_a_missing_task_is_not_found() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let ghost = TaskId::from_ulid(Ulid::new());
        let err = env
            .service
            .update_task(&admin, ghost, details(None))
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::TaskNotFound(ghost));
    }

    #[tokio::test]
    async fn deleting_a_missing_task_is_not_found() {
        let env = env();
        let admin = seed_user(&env, "admin", Role::Admin, None).await;

        let ghost = TaskId::from_ulid(Ulid::new());
        let err = env.service.delete_task(&admin, ghost).await.unwrap_err();
        assert_eq!(err, TaskError::TaskNotFound(ghost));
    }

    #[tokio::test]
    async fn unowned_tasks_are_open_to_any_actor() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let admin = seed_user(&env, "root", Role::Admin, None).await;

        let id = env.service.insert_task(&admin, details(None)).await.unwrap();

        env.service.get_authorized_task(&u1, id).await.unwrap();
        env.service
            .update_task(&u1, id, details(None).with_status(TaskStatus::InProgress))
            .await
            .unwrap();
        env.service.delete_task(&m1, id).await.unwrap();
    }

    // Current behavior, preserved deliberately: history carries no
    // authorization check at all, so any actor can inspect any task's
    // revisions. Flagged as possibly unintended in the product sense.
    #[tokio::test]
    async fn history_is_visible_without_authorization() {
        let env = env();
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;
        let u1 = seed_user(&env, "u1", Role::EndUser, Some(m1.user_id)).await;
        let admin = seed_user(&env, "root", Role::Admin, None).await;

        let id = env
            .service
            .insert_task(&admin, details(Some(admin.user_id)))
            .await
            .unwrap();

        // u1 can't read the task itself...
        let err = env.service.get_authorized_task(&u1, id).await.unwrap_err();
        assert!(matches!(err, TaskError::NotAuthorized { .. }));

        // ...but can read its full history.
        let history = env.service.get_task_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn history_of_a_task_that_never_existed_is_empty() {
        let env = env();
        let ghost = TaskId::from_ulid(Ulid::new());
        let history = env.service.get_task_history(ghost).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn listing_filters_and_sorts_by_due_date() {
        let env = env();
        let admin = seed_user(&env, "root", Role::Admin, None).await;

        for (title, days, severity) in [
            ("later", 3, TaskSeverity::Low),
            ("soon", 1, TaskSeverity::Urgent),
            ("middle", 2, TaskSeverity::Low),
        ] {
            let mut d = details(None);
            d.title = title.to_string();
            d.due_date = fixed_now() + Duration::days(days);
            d.severity = severity;
            env.service.insert_task(&admin, d).await.unwrap();
        }

        let ascending = env
            .service
            .get_tasks(
                &admin,
                &TaskQuery {
                    order: Some(SortOrder::Asc),
                    ..TaskQuery::default()
                },
            )
            .await
            .unwrap();
        let titles: Vec<&str> = ascending.iter().map(|t| t.details.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "middle", "later"]);

        let descending = env
            .service
            .get_tasks(
                &admin,
                &TaskQuery {
                    order: Some(SortOrder::Desc),
                    ..TaskQuery::default()
                },
            )
            .await
            .unwrap();
        let titles: Vec<&str> = descending.iter().map(|t| t.details.title.as_str()).collect();
        assert_eq!(titles, vec!["later", "middle", "soon"]);

        let urgent_only = env
            .service
            .get_tasks(
                &admin,
                &TaskQuery {
                    severity: Some(TaskSeverity::Urgent),
                    ..TaskQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(urgent_only.len(), 1);
        assert_eq!(urgent_only[0].details.title, "soon");
    }

    #[tokio::test]
    async fn newly_inserted_owner_is_visible_to_validation_immediately() {
        let env = env();
        let admin = seed_user(&env, "root", Role::Admin, None).await;
        let m1 = seed_user(&env, "m1", Role::Manager, None).await;

        // Insert a user and immediately reference it as an owner; the
        // directory must not serve a stale view (read-your-writes).
        let fresh = seed_user(&env, "fresh", Role::EndUser, Some(m1.user_id)).await;
        env.service
            .insert_task(&admin, details(Some(fresh.user_id)))
            .await
            .expect("freshly inserted owner must resolve");
    }
}
