use crate::{
    auth::hash_password,
    error::AppError,
    models::{UserInput, UserResponse},
    repository::{normalize_email, users},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// The password is hashed before storage and never returned.
///
/// ## Responses:
/// - `201 Created`: `{user_id, email, created_at}`.
/// - `400 Bad Request`: the email is already registered.
/// - `422 Unprocessable Entity`: invalid email, or a password shorter than 6 characters
///   or longer than 72 bytes.
#[post("")]
pub async fn create_user(
    pool: web::Data<PgPool>,
    user_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let UserInput { email, password } = user_data.into_inner();
    let email = normalize_email(&email);

    let mut conn = pool.acquire().await?;
    if users::find_by_email(&mut conn, &email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;

    let user = users::create(&mut conn, &email, &password_hash).await?;
    log::info!("registered user {}", user.user_id);

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Fetch a user's public profile by id.
#[get("/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    let mut conn = pool.acquire().await?;

    match users::find_by_id(&mut conn, user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        None => Err(AppError::NotFound(format!(
            "User with id: {} does not exist",
            user_id
        ))),
    }
}
