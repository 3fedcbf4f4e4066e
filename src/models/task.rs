use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use validator::{Validate, ValidationError};

use crate::models::user::UserResponse;

/// Default page size for task listings.
pub const DEFAULT_LIMIT: i64 = 10;
/// Largest page size a client may ask for.
pub const MAX_LIMIT: i64 = 100;

/// Represents the progress of a task.
/// Corresponds to the `task_progress` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_progress", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskProgress {
    /// Not started yet.
    Planned,
    /// Being worked on. `in-progress` is accepted on input and in searches for older clients.
    #[serde(alias = "in-progress")]
    InProgress,
    /// Finished.
    Done,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Payload for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters and not only whitespace.
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 10000))]
    pub content: String,

    pub progress: TaskProgress,
}

/// Payload for updating a task. Only the fields that are present are applied.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: Option<String>,

    #[validate(length(max = 10000))]
    pub content: Option<String>,

    pub progress: Option<TaskProgress>,
}

/// A task together with a summary of its owner, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub progress: TaskProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: UserResponse,
}

/// Rows are expected to come from a `tasks` / `users` join with the owner columns
/// aliased as `owner_email` and `owner_created_at`.
impl<'r> FromRow<'r, PgRow> for Task {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let user_id: i32 = row.try_get("user_id")?;
        Ok(Self {
            task_id: row.try_get("task_id")?,
            user_id,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            progress: row.try_get("progress")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            owner: UserResponse {
                user_id,
                email: row.try_get("owner_email")?,
                created_at: row.try_get("owner_created_at")?,
            },
        })
    }
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskQuery {
    /// Case-insensitive substring match over the content or the progress text.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// Exact match on progress.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<TaskProgress>,
    #[validate(range(min = 0, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub skip: Option<i64>,
}

impl TaskQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }
}

// `?status=` and `?search=` are sent by some clients when the field is cleared.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::deserialize(de::value::StrDeserializer::<D::Error>::new(value)).map(Some),
    }
}
