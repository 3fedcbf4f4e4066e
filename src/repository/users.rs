use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::User;

const USER_COLUMNS: &str = "user_id, email, password_hash, created_at";

/// Inserts a user. `email` must already be normalised and `password_hash` hashed.
pub async fn create(
    conn: &mut PgConnection,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let sql = format!(
        "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match AppError::from(e) {
            // Lost a race with a concurrent registration of the same email.
            AppError::BadRequest(_) => AppError::BadRequest("Email already registered".into()),
            other => other,
        })
}

pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

pub async fn find_by_id(conn: &mut PgConnection, user_id: i32) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

pub async fn exists(conn: &mut PgConnection, user_id: i32) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found)
}
