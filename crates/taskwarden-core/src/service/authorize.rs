//! Authorization evaluator: who may act on which task.

use std::collections::HashMap;

use crate::domain::{Role, TaskDetails, User, UserId};

/// Decide whether `actor` may act on a task whose state is `details`.
///
/// First match wins:
/// 1. the task has no owner (unowned tasks are open to any actor)
/// 2. the actor owns the task
/// 3. the actor is an ADMIN
/// 4. the actor is a MANAGER and the owner is one of their *direct* reports
///    (the relation is not transitive)
/// 5. otherwise: denied
///
/// The same decision gates list filtering (unauthorized items are silently
/// dropped) and single-task access (unauthorized access is a typed error).
/// Callers must not diverge from that symmetry.
///
/// `reports_by_manager` comes from `UserDirectory::manager_to_reports_map`;
/// taking it as a plain map keeps this function pure.
pub fn is_task_authorized(
    details: &TaskDetails,
    actor: &User,
    reports_by_manager: &HashMap<UserId, Vec<User>>,
) -> bool {
    match details.owner {
        None => true,
        Some(owner) if owner == actor.user_id => true,
        Some(owner) => match actor.role {
            Role::Admin => true,
            Role::Manager => reports_by_manager
                .get(&actor.user_id)
                .is_some_and(|reports| reports.iter().any(|report| report.user_id == owner)),
            Role::EndUser => false,
        },
    }
}
