use std::{env, str::FromStr};

use chrono::Duration;
use log::warn;

use crate::util::random_string;

/// Runtime configuration of the collab system
#[derive(Debug, Clone)]
pub struct Config {
    /// The secret used to sign access tokens
    pub token_secret: String,
    /// How long an access token is valid for
    pub token_ttl: Duration,
    /// How long a game invitation stays pending before it expires
    pub invitation_ttl: Duration,
    /// An optional admin account that is created on startup
    pub admin: Option<AdminSeed>,
    /// PostgreSQL connection string, data is kept in memory without one
    pub database_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl Config {
    pub const DEFAULT_TOKEN_TTL_IN_MINUTES: i64 = 60;
    pub const DEFAULT_INVITATION_TTL_IN_MINUTES: i64 = 60;

    /// Reads the configuration from `TRIVIA_*` environment variables
    pub fn from_env() -> Self {
        let token_secret = match env::var("TRIVIA_TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("TRIVIA_TOKEN_SECRET is not set, tokens will not survive a restart");
                random_string(64)
            }
        };

        let admin = match (
            env::var("TRIVIA_ADMIN_USERNAME"),
            env::var("TRIVIA_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        Self {
            token_secret,
            token_ttl: Duration::minutes(env_or(
                "TRIVIA_TOKEN_TTL_MINUTES",
                Self::DEFAULT_TOKEN_TTL_IN_MINUTES,
            )),
            invitation_ttl: Duration::minutes(env_or(
                "TRIVIA_INVITATION_TTL_MINUTES",
                Self::DEFAULT_INVITATION_TTL_IN_MINUTES,
            )),
            admin,
            database_url: env::var("TRIVIA_DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_secret: random_string(64),
            token_ttl: Duration::minutes(Self::DEFAULT_TOKEN_TTL_IN_MINUTES),
            invitation_ttl: Duration::minutes(Self::DEFAULT_INVITATION_TTL_IN_MINUTES),
            admin: None,
            database_url: None,
        }
    }
}

/// Parses an environment variable, falling back to `default` when absent or malformed
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}, using the default", key, value);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back() {
        assert_eq!(env_or("TRIVIA_SURELY_NOT_SET", 42), 42);
    }

    #[test]
    fn test_default_lifetimes() {
        let config = Config::default();

        assert_eq!(config.token_ttl, Duration::hours(1));
        assert_eq!(config.invitation_ttl, Duration::hours(1));
        assert_eq!(config.token_secret.len(), 64, "a random secret is generated");
        assert!(config.database_url.is_none(), "memory store by default");
    }

    #[test]
    fn test_database_url_from_env() {
        env::set_var("TRIVIA_DATABASE_URL", "postgres://localhost/trivia");
        let config = Config::from_env();
        env::remove_var("TRIVIA_DATABASE_URL");

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/trivia")
        );
    }
}
