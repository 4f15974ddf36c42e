use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MAPHARVEST_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_environment() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should parse");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.export_dir, std::path::PathBuf::from("./exports"));
    assert_eq!(cfg.url_prefix, "https://www.google.com/maps/");
    assert_eq!(cfg.default_max_cards, 10);
    assert_eq!(cfg.max_cards_limit, 100);
    assert!(cfg.headless);
    assert_eq!(cfg.navigation_timeout_secs, 60);
    assert_eq!(cfg.initial_load_delay_ms, 3000);
    assert_eq!(cfg.feed_timeout_secs, 10);
    assert_eq!(cfg.detail_timeout_secs, 10);
    assert_eq!(cfg.settle_ms, 3000);
    assert_eq!(cfg.scroll_pause_ms, 2000);
    assert_eq!(cfg.card_retries, 0);
    assert_eq!(cfg.download_ttl_secs, 300);
    assert_eq!(cfg.rate_limit_per_minute, 30);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_BIND_ADDR"),
        "expected InvalidEnvVar(MAPHARVEST_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_invalid_env() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_ENV"),
        "expected InvalidEnvVar(MAPHARVEST_ENV), got: {result:?}"
    );
}

#[test]
fn headless_accepts_common_boolean_spellings() {
    for (raw, expected) in [("false", false), ("0", false), ("Yes", true), ("on", true)] {
        let mut map = HashMap::new();
        map.insert("MAPHARVEST_HEADLESS", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.headless, expected, "MAPHARVEST_HEADLESS={raw}");
    }
}

#[test]
fn headless_rejects_garbage() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_HEADLESS", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_HEADLESS"),
        "expected InvalidEnvVar(MAPHARVEST_HEADLESS), got: {result:?}"
    );
}

#[test]
fn settle_ms_override() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_SETTLE_MS", "1500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.settle_ms, 1500);
}

#[test]
fn settle_ms_invalid() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_SETTLE_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_SETTLE_MS"),
        "expected InvalidEnvVar(MAPHARVEST_SETTLE_MS), got: {result:?}"
    );
}

#[test]
fn card_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_CARD_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_CARD_RETRIES"),
        "expected InvalidEnvVar(MAPHARVEST_CARD_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_when_default_exceeds_limit() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_DEFAULT_MAX_CARDS", "50");
    map.insert("MAPHARVEST_MAX_CARDS_LIMIT", "20");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_DEFAULT_MAX_CARDS"),
        "expected InvalidEnvVar(MAPHARVEST_DEFAULT_MAX_CARDS), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_zero_limit() {
    let mut map = HashMap::new();
    map.insert("MAPHARVEST_MAX_CARDS_LIMIT", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MAPHARVEST_MAX_CARDS_LIMIT"),
        "expected InvalidEnvVar(MAPHARVEST_MAX_CARDS_LIMIT), got: {result:?}"
    );
}
