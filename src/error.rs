//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler returns `Result<_, AppError>`, and `AppError` implements
//! `actix_web::error::ResponseError` so that each variant is turned into the matching
//! HTTP status with a `{"error": "..."}` JSON body.
//!
//! `From` implementations for `sqlx::Error` and `validator::ValidationErrors` allow the
//! `?` operator to be used directly on those results. Token and password failures are
//! mapped where they happen, in `auth::token` and `auth::password`.
//!
//! Storage and internal failures never leak their detail to the client: the detail is
//! logged and the response carries a generic message.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError, UrlencodedError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// The caller is not authenticated (HTTP 401): the bearer token is missing,
    /// invalid, or refers to a user that no longer exists.
    Unauthorized(String),
    /// A bearer token failed verification (HTTP 401): bad signature, malformed,
    /// or expired.
    InvalidToken(String),
    /// The caller is authenticated but may not act on the resource (HTTP 403).
    /// Also used for rejected login credentials.
    Forbidden(String),
    /// A well-formed request that cannot be honoured (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database (HTTP 500).
    DatabaseError(String),
    /// Malformed or missing input (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(msg) | AppError::InvalidToken(msg) => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
                builder.json(json!({ "error": msg }))
            }
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                log::error!("{}: {}", self.status_code(), msg);
                builder.json(json!({ "error": "Internal server error" }))
            }
            AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => builder.json(json!({ "error": msg })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, a unique-constraint violation becomes `BadRequest`,
/// everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Resource already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

// Extractor rejections. Registered through `JsonConfig`, `QueryConfig`, `FormConfig`
// and `PathConfig` so that malformed input surfaces as a validation error.

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}
