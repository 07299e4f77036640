use chrono::{Duration, Utc};

use taskwarden_core::app::AppBuilder;
use taskwarden_core::domain::{
    NewUser, Role, SortOrder, TaskDetails, TaskQuery, TaskSeverity, TaskStatus,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // (A) インメモリ構成で App を組み立てる（admin もここで作られる）
    let app = AppBuilder::new()
        .in_memory()
        .with_admin_password_hash("$demo$not-a-real-hash")
        .build()
        .await
        .expect("app should build");

    let admin = app
        .users
        .require_by_username("admin")
        .await
        .expect("bootstrap admin exists");

    // (B) マネージャと直属の部下を登録する
    let manager_id = app
        .users
        .insert_user(NewUser {
            username: "morgan".to_string(),
            password_hash: "$demo$not-a-real-hash".to_string(),
            email: "morgan@example.com".to_string(),
            role: Role::Manager,
            manager: None,
        })
        .await
        .expect("manager insert");

    let report_id = app
        .users
        .insert_user(NewUser {
            username: "riley".to_string(),
            password_hash: "$demo$not-a-real-hash".to_string(),
            email: "riley@example.com".to_string(),
            role: Role::EndUser,
            manager: Some(manager_id),
        })
        .await
        .expect("end user insert");

    let manager = app.users.require_by_username("morgan").await.unwrap();
    let report = app.users.require_by_username("riley").await.unwrap();

    // (C) マネージャが部下のタスクを作成する
    let details = TaskDetails::new(
        "Prepare quarterly report",
        TaskStatus::NotStarted,
        TaskSeverity::High,
        Utc::now() + Duration::days(7),
    )
    .with_description("Numbers for Q3, with the usual breakdown.")
    .with_owner(report_id);

    let task_id = app
        .tasks
        .insert_task(&manager, details.clone())
        .await
        .expect("task insert");
    println!("created: {task_id}");

    // (D) 部下が進捗を更新し、完了させる
    for status in [TaskStatus::InProgress, TaskStatus::Completed] {
        app.tasks
            .update_task(&report, task_id, details.clone().with_status(status))
            .await
            .expect("task update");
    }

    // (E) 期限の昇順で一覧（admin は全件見える）
    let listing = app
        .tasks
        .get_tasks(
            &admin,
            &TaskQuery {
                order: Some(SortOrder::Asc),
                ..TaskQuery::default()
            },
        )
        .await
        .expect("listing");
    for task in &listing {
        println!(
            "{}  [{:?}] {}",
            task.task_id, task.details.status, task.details.title
        );
    }

    // (F) マネージャが片付けて、履歴を JSON で眺める
    app.tasks
        .delete_task(&manager, task_id)
        .await
        .expect("task delete");

    let history = app.tasks.get_task_history(task_id).await.expect("history");
    println!(
        "{}",
        serde_json::to_string_pretty(&history).expect("history serializes")
    );
}
