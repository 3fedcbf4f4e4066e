use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use std::io;

use taskpad::auth::TokenService;
use taskpad::{db, routes, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = db::connect(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    db::migrate(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let pool = web::Data::new(pool);
    let tokens = web::Data::new(TokenService::from_config(&config));

    log::info!("Starting Taskpad server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
