use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds a value that cannot be parsed.
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
/// Returns `ConfigError` if a variable holds a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config. Tests drive this with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("SHOPBOT_ENV", "development"))?;
    let log_level = or_default("SHOPBOT_LOG_LEVEL", "info");
    let stores_path = lookup("SHOPBOT_STORES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let webdriver_url = or_default("SHOPBOT_WEBDRIVER_URL", "http://localhost:4444");
    if !(webdriver_url.starts_with("http://") || webdriver_url.starts_with("https://")) {
        return Err(invalid(
            "SHOPBOT_WEBDRIVER_URL",
            format!("\"{webdriver_url}\" is not an http(s) URL"),
        ));
    }

    let headless = parse_bool("SHOPBOT_HEADLESS", "true")?;
    let wait_timeout_secs = parse_u64("SHOPBOT_WAIT_TIMEOUT_SECS", "30")?;
    let page_load_timeout_secs = parse_u64("SHOPBOT_PAGE_LOAD_TIMEOUT_SECS", "60")?;
    let settle_delay_ms = parse_u64("SHOPBOT_SETTLE_DELAY_MS", "500")?;
    let max_concurrent_stores = parse_usize("SHOPBOT_MAX_CONCURRENT_STORES", "1")?;

    if wait_timeout_secs == 0 {
        return Err(invalid(
            "SHOPBOT_WAIT_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    if page_load_timeout_secs == 0 {
        return Err(invalid(
            "SHOPBOT_PAGE_LOAD_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        stores_path,
        webdriver_url,
        headless,
        wait_timeout_secs,
        page_load_timeout_secs,
        settle_delay_ms,
        max_concurrent_stores,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPBOT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
