use crate::{
    auth::{verify_password, verify_unknown_account, LoginForm, TokenResponse, TokenService},
    error::AppError,
    repository::{normalize_email, users},
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Login
///
/// Exchanges an email (sent as `username`) and password for a bearer token.
/// An unknown email and a wrong password both answer `403 Forbidden`, and both
/// cost one bcrypt verification.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    form.validate()?;
    let LoginForm { username, password } = form.into_inner();
    let email = normalize_email(&username);

    let user = {
        let mut conn = pool.acquire().await?;
        users::find_by_email(&mut conn, &email).await?
    };

    let user = match user {
        Some(user) => user,
        None => {
            web::block(move || verify_unknown_account(&password))
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))??;
            log::warn!("login rejected: unknown account");
            return Err(AppError::Forbidden("Invalid credentials".into()));
        }
    };

    let password_hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;
    if !matches {
        log::warn!("login rejected: wrong password for user {}", user.user_id);
        return Err(AppError::Forbidden("Invalid credentials".into()));
    }

    let access_token = tokens.issue(user.user_id)?;
    log::info!("user {} logged in", user.user_id);
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(access_token)))
}
