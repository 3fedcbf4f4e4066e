use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use std::sync::OnceLock;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::ValidationError(format!(
            "password: must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// A password longer than [`MAX_PASSWORD_BYTES`] never matches: it could not have been
/// stored, and bcrypt would otherwise compare only its prefix.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

/// Spends one verification on a throwaway hash and reports no match.
///
/// Used for logins naming an unknown account so they take as long as a wrong password.
pub fn verify_unknown_account(password: &str) -> Result<bool, AppError> {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    let hashed = match DUMMY_HASH.get() {
        Some(hashed) => hashed,
        None => {
            let hashed = hash_password("no-such-account")?;
            DUMMY_HASH.get_or_init(|| hashed)
        }
    };
    verify_password(password, hashed)?;
    Ok(false)
}
