use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::guard::UserIdentity;
use crate::error::AppError;

/// The authenticated caller of a request.
///
/// Only usable on routes wrapped by `AuthMiddleware`, which verifies the bearer token
/// and stores the resolved `UserIdentity` in the request extensions. Without it the
/// extractor fails with `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserIdentity);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<UserIdentity>().copied() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity))),
            None => {
                let err = AppError::Unauthorized("Not authenticated".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
