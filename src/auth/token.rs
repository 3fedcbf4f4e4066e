use crate::config::Config;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the user the token acts for.
    pub user_id: i32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Built once from [`Config`] and shared by every worker. Tokens are stateless:
/// nothing is stored server-side, so a token stays valid until its `exp` passes.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expires_in: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            expires_in,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.secret_key.as_bytes(),
            config.algorithm,
            Duration::minutes(config.access_token_expire_minutes),
        )
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issues a token for `user_id`, valid from now for the configured duration.
    pub fn issue(&self, user_id: i32) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit issue time.
    pub fn issue_at(&self, user_id: i32, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.expires_in).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies `token` and returns the user id it carries.
    ///
    /// Fails with `AppError::InvalidToken` when the signature does not match, the header
    /// names a different algorithm, the token is malformed, or it has expired.
    pub fn verify(&self, token: &str) -> Result<i32, AppError> {
        self.verify_at(token, Utc::now())
    }

    /// Same as [`verify`](Self::verify) against an explicit clock.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i32, AppError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against `now`, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(format!("Invalid token: {}", e)))?;

        if claims.exp <= now.timestamp() {
            return Err(AppError::InvalidToken(
                "Invalid token: ExpiredSignature".into(),
            ));
        }

        Ok(claims.user_id)
    }
}
