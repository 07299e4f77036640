//! Task validation: ordered field and business-rule checks.

use chrono::{DateTime, Utc};

use crate::domain::{TaskDetails, TaskError};
use crate::ports::UserDirectory;

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Validate `details` before any mutation is committed.
///
/// The check order is part of the contract (the first failing check is the
/// one surfaced): owner existence, due date, title, description. The only
/// side effect is the directory lookup for the owner.
pub async fn validate_details(
    details: &TaskDetails,
    directory: &dyn UserDirectory,
    now: DateTime<Utc>,
) -> Result<(), TaskError> {
    if let Some(owner) = details.owner
        && directory.find_by_id(owner).await?.is_none()
    {
        return Err(TaskError::OwnerDoesNotExist(owner));
    }

    if details.due_date < now {
        return Err(TaskError::DueDateInPast(details.due_date));
    }

    if details.title.trim().is_empty() {
        return Err(TaskError::MissingTitle);
    }
    if details.title.chars().count() > TITLE_MAX_LEN {
        return Err(TaskError::FieldTooLong {
            field: "title",
            limit: TITLE_MAX_LEN,
        });
    }

    if let Some(description) = &details.description
        && description.chars().count() > DESCRIPTION_MAX_LEN
    {
        return Err(TaskError::FieldTooLong {
            field: "description",
            limit: DESCRIPTION_MAX_LEN,
        });
    }

    Ok(())
}
