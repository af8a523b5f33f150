use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_TARGET_URL: &str = "https://www.shopback.com.au/all-stores";

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
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
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

    let database_url = normalize_database_url(&require("DATABASE_URL")?);
    let env = parse_environment(&or_default("OFFERHUB_ENV", "development"));

    let bind_raw = or_default("OFFERHUB_BIND_ADDR", "0.0.0.0:5000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "OFFERHUB_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("OFFERHUB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("OFFERHUB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("OFFERHUB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_num("OFFERHUB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let webdriver_url = or_default("OFFERHUB_WEBDRIVER_URL", "http://localhost:4444");
    let target_url = or_default("OFFERHUB_TARGET_URL", DEFAULT_TARGET_URL);
    let navigation_timeout_secs = parse_num("OFFERHUB_NAVIGATION_TIMEOUT_SECS", "90")?;

    let scroll_raw = or_default("OFFERHUB_SCROLL_DELTA_PX", "1000");
    let scroll_delta_px = scroll_raw
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "OFFERHUB_SCROLL_DELTA_PX".to_string(),
            reason: e.to_string(),
        })?;
    let scroll_settle_ms = parse_num("OFFERHUB_SCROLL_SETTLE_MS", "2000")?;
    let step_timeout_secs = parse_num("OFFERHUB_STEP_TIMEOUT_SECS", "30")?;

    let max_scroll_rounds = parse_u32("OFFERHUB_MAX_SCROLL_ROUNDS", "20")?;
    let stable_rounds = parse_u32("OFFERHUB_STABLE_ROUNDS", "3")?;
    if stable_rounds == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OFFERHUB_STABLE_ROUNDS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if max_scroll_rounds == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OFFERHUB_MAX_SCROLL_ROUNDS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let extract_max_retries = parse_u32("OFFERHUB_EXTRACT_MAX_RETRIES", "2")?;

    let scrape_cron = or_default("OFFERHUB_SCRAPE_CRON", "0 0 */6 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        webdriver_url,
        target_url,
        navigation_timeout_secs,
        scroll_delta_px,
        scroll_settle_ms,
        step_timeout_secs,
        max_scroll_rounds,
        stable_rounds,
        extract_max_retries,
        scrape_cron,
    })
}

/// Hosting providers hand out `postgres://` URLs; both schemes are accepted
/// by sqlx but the canonical one keeps logs and comparisons consistent.
fn normalize_database_url(raw: &str) -> String {
    match raw.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => raw.to_string(),
    }
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
