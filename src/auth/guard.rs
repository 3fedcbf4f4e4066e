//! Resolves a raw `Authorization` header value to a user identity.
//!
//! Resolution is purely cryptographic: the user row is not looked up. Code that joins
//! the identity against storage must check that the user still exists.

use crate::auth::token::TokenService;
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// The identity a request acts as, once its bearer token has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: i32,
}

/// Strips the `Bearer ` scheme from a header value. The scheme is matched
/// case-insensitively, the token itself is returned untouched.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = value.get(BEARER_PREFIX.len()..)?.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticates a request from its raw `Authorization` header value.
///
/// Fails with `AppError::Unauthorized` if the header is absent, is not a bearer
/// credential, or carries a token that does not verify.
pub fn authenticate(tokens: &TokenService, raw: Option<&str>) -> Result<UserIdentity, AppError> {
    let raw = raw.ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
    let token = bearer_token(raw)
        .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".into()))?;

    match tokens.verify(token) {
        Ok(user_id) => Ok(UserIdentity { user_id }),
        Err(err) => {
            log::debug!("rejected bearer token: {}", err);
            Err(AppError::Unauthorized(
                "Could not validate credentials".into(),
            ))
        }
    }
}
