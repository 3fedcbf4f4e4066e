use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskUpdate},
    repository::{tasks, users},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Lists the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): exact progress match (`planned`, `in_progress`, `done`).
/// - `search` (optional): case-insensitive substring of the content or progress.
/// - `limit` (optional, default 10, at most 100) and `skip` (optional, default 0).
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks, ordered by id.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `422 Unprocessable Entity`: unknown status or negative pagination values.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let mut conn = pool.acquire().await?;
    let tasks = tasks::list(&mut conn, user.user_id(), &query).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new task, including its `owner`.
/// - `401 Unauthorized`: missing or invalid token, or the account no longer exists.
/// - `422 Unprocessable Entity`: empty title or missing/unknown progress.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut conn = pool.acquire().await?;
    if !users::exists(&mut conn, user.user_id()).await? {
        return Err(AppError::Unauthorized("User no longer exists".into()));
    }

    let task = tasks::create(&mut conn, user.user_id(), task_data.into_inner()).await?;
    log::debug!("user {} created task {}", user.user_id(), task.task_id);

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `403 Forbidden`: the task belongs to another user.
/// - `404 Not Found`: no task with this id.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let mut conn = pool.acquire().await?;
    let task = tasks::get(&mut conn, task_id.into_inner(), user.user_id()).await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates the provided fields of a task.
///
/// ## Responses:
/// - `200 OK`: the task after the update.
/// - `403 Forbidden` / `404 Not Found`: as for `GET /tasks/{id}`.
/// - `422 Unprocessable Entity`: empty title or unknown progress.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut conn = pool.acquire().await?;
    let task = tasks::update(
        &mut conn,
        task_id.into_inner(),
        user.user_id(),
        task_data.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `200 OK`: `{"detail": "Task with id {id} was deleted"}`.
/// - `403 Forbidden` / `404 Not Found`: as for `GET /tasks/{id}`.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let mut conn = pool.acquire().await?;
    tasks::delete(&mut conn, task_id, user.user_id()).await?;
    log::debug!("user {} deleted task {}", user.user_id(), task_id);

    Ok(HttpResponse::Ok().json(json!({
        "detail": format!("Task with id {} was deleted", task_id)
    })))
}
