use std::env::VarError;

use thiserror::Error;

use crate::app_config::{AppConfig, DatabaseSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, &e))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, &e))
    };

    let database_url = match lookup("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => build_database_settings(&lookup)?.connection_url(),
    };

    let bind_addr = or_default("PRODSTORE_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PRODSTORE_BIND_ADDR", &e))?;
    let log_level = or_default("PRODSTORE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("PRODSTORE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PRODSTORE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PRODSTORE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRODSTORE_DB_MIN_CONNECTIONS".to_string(),
            reason: format!("must not exceed PRODSTORE_DB_MAX_CONNECTIONS ({db_max_connections})"),
        });
    }

    Ok(AppConfig {
        database_url,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Read the split `DB_*` connection variables.
fn build_database_settings<F>(lookup: &F) -> Result<DatabaseSettings, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let host = require("DB_HOST")?;
    let port = require("DB_PORT")?
        .parse::<u16>()
        .map_err(|e| invalid("DB_PORT", &e))?;
    let user = require("DB_USER")?;
    let password = require("DB_PASSWORD")?;
    let name = require("DB_NAME")?;
    let sslmode = lookup("DB_SSLMODE").unwrap_or_else(|_| "disable".to_string());

    Ok(DatabaseSettings {
        host,
        port,
        user,
        password,
        name,
        sslmode,
    })
}

fn invalid(var: &str, reason: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
