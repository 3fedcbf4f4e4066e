mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;
use taskpad::models::UserResponse;

use common::{cleanup_user, init_app, register, setup, try_login, unique_email};

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;
    let email = unique_email("register");

    let user = register(&app, &email, "Password123!").await;
    assert_eq!(user.email, email);

    // Same email again
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, token) = try_login(&app, &email, "Password123!").await;
    assert_eq!(status, StatusCode::OK);
    let token = token.expect("login should return a token");
    assert_eq!(ctx.tokens.verify(&token).unwrap(), user.user_id);

    // The stored email is case-insensitive for login.
    let (status, _) = try_login(&app, &email.to_uppercase(), "Password123!").await;
    assert_eq!(status, StatusCode::OK);

    cleanup_user(&ctx.pool, &email).await;
}

#[actix_rt::test]
async fn test_login_with_other_password_is_forbidden() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;

    for (password, wrong) in [
        ("Password123!", "Password123"),
        ("correct horse battery staple", "correct horse battery stapler"),
        ("ünïcødé-pässwörd", "unicode-password"),
    ] {
        let email = unique_email("login");
        register(&app, &email, password).await;

        let (status, token) = try_login(&app, &email, password).await;
        assert_eq!(status, StatusCode::OK);
        assert!(token.is_some());

        let (status, token) = try_login(&app, &email, wrong).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "password {:?} must be rejected", wrong);
        assert!(token.is_none());

        cleanup_user(&ctx.pool, &email).await;
    }

    let (status, _) = try_login(&app, &unique_email("nobody"), "Password123!").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;

    let test_cases = vec![
        (json!({ "password": "Password123!" }), "missing email"),
        (json!({ "email": "test@example.com" }), "missing password"),
        (
            json!({ "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "email": "test@example.com", "password": "123" }),
            "password too short",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;

        assert_eq!(
            status,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body)
        );
    }
}

#[actix_rt::test]
async fn test_passwords_beyond_bcrypt_limit() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;

    let email = unique_email("long");
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": email, "password": format!("{}correct", "a".repeat(72)) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // At the limit registration works, and nothing sharing that prefix logs in.
    let password = "a".repeat(72);
    register(&app, &email, &password).await;

    let (status, _) = try_login(&app, &email, &password).await;
    assert_eq!(status, StatusCode::OK);

    let (status, token) = try_login(&app, &email, &format!("{}WRONG", password)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(token.is_none());

    cleanup_user(&ctx.pool, &email).await;
}

#[actix_rt::test]
async fn test_login_requires_both_fields() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "someone@example.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_get_user() {
    let Some(ctx) = setup().await else { return };
    let app = init_app(&ctx).await;
    let email = unique_email("profile");
    let created = register(&app, &email, "Password123!").await;

    let req = test::TestRequest::get()
        .uri(&format!("/users/{}", created.user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let fetched: UserResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, created);

    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(raw.get("password").is_none());
    assert!(raw.get("password_hash").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/users/{}", i32::MAX))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    cleanup_user(&ctx.pool, &email).await;
}
