use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

/// Health check endpoint
///
/// Reports whether the database answers. `503 Service Unavailable` when it does not.
#[get("/health")]
pub async fn health(pool: web::Data<PgPool>) -> impl Responder {
    let database_up = sqlx::query("SELECT 1").execute(pool.get_ref()).await.is_ok();

    let body = json!({
        "status": if database_up { "ok" } else { "degraded" },
        "database": if database_up { "up" } else { "down" },
        "timestamp": Utc::now()
    });

    if database_up {
        HttpResponse::Ok().json(body)
    } else {
        log::warn!("health check: database unreachable");
        HttpResponse::ServiceUnavailable().json(body)
    }
}
