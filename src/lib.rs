#![doc = "The `taskpad` library crate."]
#![doc = ""]
#![doc = "Bearer-token authentication, per-user task storage with ownership checks, the"]
#![doc = "HTTP routes that expose them, configuration and error handling. The binary"]
#![doc = "(`main.rs`) wires these together into an actix-web server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

pub use crate::config::Config;
pub use crate::error::AppError;
