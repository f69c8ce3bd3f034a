//! Casting Service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum JWKS cache TTL in seconds (1 day).
pub const MAX_JWKS_CACHE_TTL_SECONDS: u64 = 86_400;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 5;

/// Maximum JWKS fetch timeout in seconds.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Casting Service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Token issuer domain, without scheme (e.g. "tenant.auth0.com").
    pub auth0_domain: String,

    /// Expected `aud` claim.
    pub api_audience: String,

    /// Expected `iss` claim (default: `https://<domain>/`).
    pub jwt_issuer: String,

    /// Issuer key set location (default: `https://<domain>/.well-known/jwks.json`).
    pub jwks_url: String,

    /// How long a fetched key set is served before refetching.
    pub jwks_cache_ttl_seconds: u64,

    /// Upper bound on a single key set fetch.
    pub jwks_fetch_timeout_seconds: u64,

    /// Database pool size.
    pub db_max_connections: u32,

    /// Insert the sample actors and movies at startup.
    pub seed_data: bool,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth0_domain", &self.auth0_domain)
            .field("api_audience", &self.api_audience)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwks_url", &self.jwks_url)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("jwks_fetch_timeout_seconds", &self.jwks_fetch_timeout_seconds)
            .field("db_max_connections", &self.db_max_connections)
            .field("seed_data", &self.seed_data)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid issuer domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid flag: {0}")]
    InvalidFlag(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let auth0_domain = parse_domain(&required(vars, "AUTH0_DOMAIN")?)?;
        let api_audience = required(vars, "API_AUDIENCE")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_issuer = vars
            .get("JWT_ISSUER")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/", auth0_domain));

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", auth0_domain));

        let jwks_cache_ttl_seconds = parse_bounded_seconds(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
            MAX_JWKS_CACHE_TTL_SECONDS,
        )?;

        let jwks_fetch_timeout_seconds = parse_bounded_seconds(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            MAX_JWKS_FETCH_TIMEOUT_SECONDS,
        )?;

        let db_max_connections = if let Some(value_str) = vars.get("DB_MAX_CONNECTIONS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDatabase(format!(
                    "DB_MAX_CONNECTIONS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidDatabase(
                    "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_DB_MAX_CONNECTIONS
        };

        let seed_data = match vars.get("SEED_DATA").map(|v| v.trim().to_ascii_lowercase()) {
            None => false,
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" || v.is_empty() => false,
            Some(v) => {
                return Err(ConfigError::InvalidFlag(format!(
                    "SEED_DATA must be true or false, got '{}'",
                    v
                )))
            }
        };

        Ok(Config {
            database_url,
            bind_address,
            auth0_domain,
            api_audience,
            jwt_issuer,
            jwks_url,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            db_max_connections,
            seed_data,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// The issuer domain is a bare host; scheme and path are added by the service.
fn parse_domain(raw: &str) -> Result<String, ConfigError> {
    if raw.contains("://") || raw.contains('/') || raw.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidDomain(format!(
            "AUTH0_DOMAIN must be a bare host name without scheme or path, got '{}'",
            raw
        )));
    }
    Ok(raw.to_string())
}

fn parse_bounded_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        ConfigError::InvalidJwks(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidJwks(format!(
            "{} must be greater than 0",
            name
        )));
    }

    if value > max {
        return Err(ConfigError::InvalidJwks(format!(
            "{} must not exceed {} seconds, got {}",
            name, max, value
        )));
    }

    Ok(value)
}
