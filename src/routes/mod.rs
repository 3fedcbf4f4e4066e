pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::{form_error_handler, json_error_handler, path_error_handler, query_error_handler};

/// Registers every route plus the extractor configuration.
///
/// The app must also carry `web::Data<PgPool>` and `web::Data<TokenService>`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::FormConfig::default().error_handler(form_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health::health)
        .service(auth::login)
        .service(
            web::scope("/users")
                .service(users::create_user)
                .service(users::get_user),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
