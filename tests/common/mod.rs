//! Shared setup for the database-backed integration tests.
//!
//! Tests need `DATABASE_URL` (read from the environment or `.env`) pointing at a
//! PostgreSQL database they may write to. When it is not set, each test prints a
//! notice and returns early.
#![allow(dead_code)]

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{http::StatusCode, test, web, App};
use chrono::Duration;
use dotenv::dotenv;
use jsonwebtoken::Algorithm;
use serde_json::json;
use sqlx::PgPool;
use taskpad::auth::{TokenResponse, TokenService};
use taskpad::models::UserResponse;
use taskpad::{db, routes};

pub const TEST_SECRET: &[u8] = b"integration_test_secret";

pub struct TestContext {
    pub pool: PgPool,
    pub tokens: TokenService,
}

pub async fn setup() -> Option<TestContext> {
    dotenv().ok();
    let _ = env_logger::builder().is_test(true).try_init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database-backed test");
            return None;
        }
    };
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    db::migrate(&pool).await.expect("Failed to run migrations");

    Some(TestContext {
        pool,
        tokens: TokenService::new(TEST_SECRET, Algorithm::HS256, Duration::minutes(30)),
    })
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.pool.clone()))
            .app_data(web::Data::new(ctx.tokens.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .configure(routes::config),
    )
    .await
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}

pub async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

pub async fn register(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> UserResponse {
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("Failed to parse registration response")
}

/// Logs in and returns the response status with the token, if any.
pub async fn try_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> (StatusCode, Option<String>) {
    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", email), ("password", password)])
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if !status.is_success() {
        return (status, None);
    }
    let token: TokenResponse =
        serde_json::from_slice(&body).expect("Failed to parse login response");
    assert_eq!(token.token_type, "bearer");
    (status, Some(token.access_token))
}

pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> String {
    match try_login(app, email, password).await {
        (StatusCode::OK, Some(token)) => token,
        (status, _) => panic!("Login failed with status {}", status),
    }
}

/// A registered and logged-in user.
pub struct TestUser {
    pub id: i32,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

pub async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    prefix: &str,
) -> TestUser {
    let email = unique_email(prefix);
    let password = "Password123!";
    let user = register(app, &email, password).await;
    let token = login(app, &email, password).await;
    TestUser {
        id: user.user_id,
        email,
        token,
    }
}

/// Sends `req` and returns the status, whether the service answered or errored
/// (middleware rejections surface as errors in `actix_web::test`).
pub async fn status_of(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: Request,
) -> StatusCode {
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.error_response().status(),
    }
}
