//! Application configuration, read once from the environment at start-up.
//!
//! The resulting [`Config`] is passed by reference to whatever needs it
//! (the token service, the database pool builder, the HTTP server).

use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_EXPIRE_MINUTES: i64 = 30;

/// Errors raised while building a [`Config`].
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set but its value cannot be used.
    Invalid { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid { name, reason } => write!(f, "{} is invalid: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// Secret used to sign and verify access tokens.
    pub secret_key: String,
    /// Signing algorithm. Only the HMAC family is accepted since tokens are
    /// signed with a shared secret.
    pub algorithm: Algorithm,
    /// Validity of an access token, in minutes.
    pub access_token_expire_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let secret_key = required("SECRET_KEY")?;

        let database_max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", &lookup, DEFAULT_MAX_CONNECTIONS)?;
        let server_host =
            lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        let server_port = parse_or("SERVER_PORT", &lookup, DEFAULT_SERVER_PORT)?;

        let algorithm_name = lookup("ALGORITHM").unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());
        let algorithm = parse_algorithm(&algorithm_name)?;

        let access_token_expire_minutes = parse_or(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            &lookup,
            DEFAULT_EXPIRE_MINUTES,
        )?;
        if access_token_expire_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be a positive number of minutes".into(),
            });
        }

        Ok(Self {
            database_url,
            database_max_connections,
            server_host,
            server_port,
            secret_key,
            algorithm,
            access_token_expire_minutes,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: "ALGORITHM",
        reason: e.to_string(),
    })?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(ConfigError::Invalid {
            name: "ALGORITHM",
            reason: format!("{:?} is not an HMAC algorithm", other),
        }),
    }
}
