use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let directus_url = require("DIRECTUS_URL")?;
    let directus_token = require("DIRECTUS_TOKEN")?;
    let medusa_url = require("MEDUSA_URL")?;
    let medusa_api_key = require("MEDUSA_API_KEY")?;
    let database_url = optional("DATABASE_URL");

    let env = match optional("DMSYNC_ENV") {
        Some(raw) => parse_environment(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "DMSYNC_ENV".to_string(),
            reason: format!("expected development, test or production, got '{raw}'"),
        })?,
        None => Environment::Development,
    };
    let bind_addr = parse_addr("DMSYNC_BIND_ADDR", "0.0.0.0:8055")?;
    let log_level = or_default("DMSYNC_LOG_LEVEL", "info");

    let collection = or_default("DMSYNC_COLLECTION", "weframe_products");
    if collection.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "DMSYNC_COLLECTION".to_string(),
            reason: "collection name must not be empty".to_string(),
        });
    }

    let currency_code = or_default("DMSYNC_CURRENCY_CODE", "usd").to_lowercase();
    if currency_code.len() != 3 || !currency_code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::InvalidEnvVar {
            var: "DMSYNC_CURRENCY_CODE".to_string(),
            reason: format!("expected a three-letter ISO 4217 code, got \"{currency_code}\""),
        });
    }

    let request_timeout_secs = parse_u64("DMSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("DMSYNC_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("DMSYNC_RETRY_BACKOFF_BASE_MS", "500")?;
    let sync_schedule = optional("DMSYNC_SYNC_SCHEDULE");

    let db_max_connections = parse_u32("DMSYNC_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("DMSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("DMSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        directus_url,
        directus_token,
        medusa_url,
        medusa_api_key,
        database_url,
        collection,
        currency_code,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        sync_schedule,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values yield `None`. Development turns webhook auth off, so a
/// typo must never select it.
fn parse_environment(s: &str) -> Option<Environment> {
    match s.trim() {
        "production" => Some(Environment::Production),
        "test" => Some(Environment::Test),
        "development" => Some(Environment::Development),
        _ => None,
    }
}
