pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::AuthenticatedUser;
pub use guard::{authenticate, UserIdentity};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password, verify_unknown_account, MAX_PASSWORD_BYTES};
pub use token::{Claims, TokenService};

/// OAuth2 password-style login form (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    /// The account's email address. Named `username` for OAuth2 clients.
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
