//! Task storage with ownership enforcement.
//!
//! `get`, `update` and `delete` all run the same check: look the task up by id
//! regardless of owner, answer `NotFound` if it does not exist, then `Forbidden` if it
//! belongs to someone else. Existence is deliberately reported before ownership.
//!
//! Concurrent updates of the same task are not ordered beyond the row lock taken for
//! the duration of each write: the last write wins.

use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskQuery, TaskUpdate};

const TASK_COLUMNS: &str = "t.task_id, t.user_id, t.title, t.content, t.progress, \
     t.created_at, t.updated_at, u.email AS owner_email, u.created_at AS owner_created_at";

/// Existence-then-ownership check shared by `get`, `update` and `delete`.
///
/// `found_owner` is the `user_id` recorded on the task, or `None` if there is no
/// task with that id.
pub fn check_owner(task_id: i32, found_owner: Option<i32>, owner_id: i32) -> Result<(), AppError> {
    match found_owner {
        None => Err(AppError::NotFound(format!(
            "Task with id: {} not found",
            task_id
        ))),
        Some(user_id) if user_id != owner_id => Err(AppError::Forbidden(
            "Not authorized to perform requested action".into(),
        )),
        Some(_) => Ok(()),
    }
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Progress is stored as `in_progress` but also accepted as `in-progress`, so the
/// search over it treats the two spellings alike.
fn progress_pattern(term: &str) -> String {
    contains_pattern(&term.replace('-', "_"))
}

/// Lists the tasks owned by `owner_id`, filtered and paginated by `query`.
///
/// `query` is expected to have been validated already (non-negative `skip`/`limit`).
pub async fn list(
    conn: &mut PgConnection,
    owner_id: i32,
    query: &TaskQuery,
) -> Result<Vec<Task>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM tasks t JOIN users u ON u.user_id = t.user_id WHERE t.user_id = ",
        TASK_COLUMNS
    ));
    builder.push_bind(owner_id);

    if let Some(status) = query.status {
        builder.push(" AND t.progress = ").push_bind(status);
    }
    if let Some(search) = &query.search {
        builder
            .push(" AND (t.content ILIKE ")
            .push_bind(contains_pattern(search))
            .push(" OR t.progress::text ILIKE ")
            .push_bind(progress_pattern(search))
            .push(")");
    }

    builder
        .push(" ORDER BY t.task_id LIMIT ")
        .push_bind(query.limit())
        .push(" OFFSET ")
        .push_bind(query.skip());

    let tasks = builder
        .build_query_as::<Task>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(tasks)
}

async fn find(conn: &mut PgConnection, task_id: i32) -> Result<Option<Task>, AppError> {
    let sql = format!(
        "SELECT {} FROM tasks t JOIN users u ON u.user_id = t.user_id WHERE t.task_id = $1",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(task)
}

/// Owner of `task_id`, locking the row until the surrounding transaction ends.
async fn lock_owner(conn: &mut PgConnection, task_id: i32) -> Result<Option<i32>, AppError> {
    let owner = sqlx::query_scalar::<_, i32>("SELECT user_id FROM tasks WHERE task_id = $1 FOR UPDATE")
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(owner)
}

pub async fn get(conn: &mut PgConnection, task_id: i32, owner_id: i32) -> Result<Task, AppError> {
    let task = find(conn, task_id).await?;
    check_owner(task_id, task.as_ref().map(|t| t.user_id), owner_id)?;
    task.ok_or_else(|| AppError::NotFound(format!("Task with id: {} not found", task_id)))
}

/// Creates a task owned by `owner_id`. The caller is responsible for validating
/// `input`. An owner that does not exist (or was deleted concurrently) is
/// `Unauthorized`, since the only route here is a token for a vanished account.
pub async fn create(
    conn: &mut PgConnection,
    owner_id: i32,
    input: TaskInput,
) -> Result<Task, AppError> {
    let sql = format!(
        "WITH t AS (
             INSERT INTO tasks (user_id, title, content, progress)
             VALUES ($1, $2, $3, $4)
             RETURNING *
         )
         SELECT {} FROM t JOIN users u ON u.user_id = t.user_id",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(owner_id)
        .bind(input.title)
        .bind(input.content)
        .bind(input.progress)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::Unauthorized("User no longer exists".into())
            }
            e => AppError::from(e),
        })?;
    Ok(task)
}

/// Applies the fields present in `fields` and refreshes `updated_at`.
pub async fn update(
    conn: &mut PgConnection,
    task_id: i32,
    owner_id: i32,
    fields: TaskUpdate,
) -> Result<Task, AppError> {
    let mut tx = conn.begin().await?;

    let owner = lock_owner(&mut *tx, task_id).await?;
    check_owner(task_id, owner, owner_id)?;

    let sql = format!(
        "WITH t AS (
             UPDATE tasks
             SET title = COALESCE($1, title),
                 content = COALESCE($2, content),
                 progress = COALESCE($3, progress),
                 updated_at = now()
             WHERE task_id = $4
             RETURNING *
         )
         SELECT {} FROM t JOIN users u ON u.user_id = t.user_id",
        TASK_COLUMNS
    );
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(fields.title)
        .bind(fields.content)
        .bind(fields.progress)
        .bind(task_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(task)
}

pub async fn delete(conn: &mut PgConnection, task_id: i32, owner_id: i32) -> Result<(), AppError> {
    let mut tx = conn.begin().await?;

    let owner = lock_owner(&mut *tx, task_id).await?;
    check_owner(task_id, owner, owner_id)?;

    sqlx::query("DELETE FROM tasks WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
