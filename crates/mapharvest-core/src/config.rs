use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
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
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config. Tests drive this with a `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
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
            _ => Err(invalid(var, format!("expected a boolean, got \"{raw}\""))),
        }
    };

    let env = parse_environment(&or_default("MAPHARVEST_ENV", "development"))?;

    let bind_addr = parse_addr("MAPHARVEST_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MAPHARVEST_LOG_LEVEL", "info");
    let export_dir = PathBuf::from(or_default("MAPHARVEST_EXPORT_DIR", "./exports"));
    let url_prefix = or_default("MAPHARVEST_URL_PREFIX", "https://www.google.com/maps/");

    let default_max_cards = parse_usize("MAPHARVEST_DEFAULT_MAX_CARDS", "10")?;
    let max_cards_limit = parse_usize("MAPHARVEST_MAX_CARDS_LIMIT", "100")?;
    if max_cards_limit == 0 {
        return Err(invalid(
            "MAPHARVEST_MAX_CARDS_LIMIT",
            "must be greater than zero".to_string(),
        ));
    }
    if default_max_cards == 0 || default_max_cards > max_cards_limit {
        return Err(invalid(
            "MAPHARVEST_DEFAULT_MAX_CARDS",
            format!("must be between 1 and {max_cards_limit}"),
        ));
    }

    let headless = parse_bool("MAPHARVEST_HEADLESS", "true")?;
    let navigation_timeout_secs = parse_u64("MAPHARVEST_NAVIGATION_TIMEOUT_SECS", "60")?;
    let initial_load_delay_ms = parse_u64("MAPHARVEST_INITIAL_LOAD_DELAY_MS", "3000")?;
    let feed_timeout_secs = parse_u64("MAPHARVEST_FEED_TIMEOUT_SECS", "10")?;
    let detail_timeout_secs = parse_u64("MAPHARVEST_DETAIL_TIMEOUT_SECS", "10")?;
    let settle_ms = parse_u64("MAPHARVEST_SETTLE_MS", "3000")?;
    let scroll_pause_ms = parse_u64("MAPHARVEST_SCROLL_PAUSE_MS", "2000")?;
    let card_retries = parse_u32("MAPHARVEST_CARD_RETRIES", "0")?;
    let download_ttl_secs = parse_u64("MAPHARVEST_DOWNLOAD_TTL_SECS", "300")?;
    let rate_limit_per_minute = parse_usize("MAPHARVEST_RATE_LIMIT_PER_MINUTE", "30")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        export_dir,
        url_prefix,
        default_max_cards,
        max_cards_limit,
        headless,
        navigation_timeout_secs,
        initial_load_delay_ms,
        feed_timeout_secs,
        detail_timeout_secs,
        settle_ms,
        scroll_pause_ms,
        card_retries,
        download_ttl_secs,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MAPHARVEST_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
