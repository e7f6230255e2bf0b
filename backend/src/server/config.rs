//! Server configuration from environment variables.
//!
//! ```text
//! PORTAL_BIND                bind address, default 0.0.0.0:4000
//! PORTAL_ACCESS_TTL_MINS     access token lifetime, default 15
//! PORTAL_REFRESH_TTL_DAYS    refresh token lifetime, default 7
//! PORTAL_CLERK_EMAIL/PORTAL_CLERK_PASSWORD   seed a clerk account
//! PORTAL_ADMIN_EMAIL/PORTAL_ADMIN_PASSWORD   seed an admin account
//! ```

use std::env;
use std::net::SocketAddr;

use chrono::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:4000";
const DEFAULT_ACCESS_TTL_MINS: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Configuration failures surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not a valid bind address: {value}")]
    InvalidBindAddr { key: &'static str, value: String },
    #[error("{key} is not a positive integer: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{email_key} and {password_key} must be set together")]
    IncompleteSeed {
        email_key: &'static str,
        password_key: &'static str,
    },
}

/// Credentials for an account provisioned at bootstrap.
#[derive(Debug, Clone)]
pub struct SeedCredentials {
    pub email: String,
    pub password: String,
}

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clerk: Option<SeedCredentials>,
    admin: Option<SeedCredentials>,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("PORTAL_BIND").unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr {
                key: "PORTAL_BIND",
                value: bind_raw.clone(),
            })?;

        let access_mins = parse_positive(
            "PORTAL_ACCESS_TTL_MINS",
            lookup("PORTAL_ACCESS_TTL_MINS"),
            DEFAULT_ACCESS_TTL_MINS,
        )?;
        let refresh_days = parse_positive(
            "PORTAL_REFRESH_TTL_DAYS",
            lookup("PORTAL_REFRESH_TTL_DAYS"),
            DEFAULT_REFRESH_TTL_DAYS,
        )?;

        Ok(Self {
            bind_addr,
            access_ttl: Duration::minutes(access_mins),
            refresh_ttl: Duration::days(refresh_days),
            clerk: seed_pair(&lookup, "PORTAL_CLERK_EMAIL", "PORTAL_CLERK_PASSWORD")?,
            admin: seed_pair(&lookup, "PORTAL_ADMIN_EMAIL", "PORTAL_ADMIN_PASSWORD")?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn clerk(&self) -> Option<&SeedCredentials> {
        self.clerk.as_ref()
    }

    pub fn admin(&self) -> Option<&SeedCredentials> {
        self.admin.as_ref()
    }
}

fn parse_positive(
    key: &'static str,
    value: Option<String>,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn seed_pair(
    lookup: impl Fn(&str) -> Option<String>,
    email_key: &'static str,
    password_key: &'static str,
) -> Result<Option<SeedCredentials>, ConfigError> {
    match (lookup(email_key), lookup(password_key)) {
        (Some(email), Some(password)) => Ok(Some(SeedCredentials { email, password })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::IncompleteSeed {
            email_key,
            password_key,
        }),
    }
}
