use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::auth::MAX_PASSWORD_BYTES;

/// A user row as stored in the `users` table.
///
/// Never serialized directly: use [`UserResponse`] so the hash stays server-side.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// `length` counts characters; bcrypt's limit is in bytes.
fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("too_long"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6), custom = "validate_password_bytes")]
    pub password: String, // hashed before it reaches the database
}

/// Public view of a user. Also embedded as the `owner` of every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
