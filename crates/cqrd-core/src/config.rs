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
/// Unlike [`load_app_config`], this does not touch `.env` files, which suits
/// tests and callers that manage env setup themselves.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so tests can drive it with a plain `HashMap` lookup instead of
/// `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let source_url = require("CQRD_SOURCE_URL")?;
    let source_api_key = lookup("CQRD_SOURCE_API_KEY").ok();

    let env = parse_environment(&or_default("CQRD_ENV", "development"));

    let bind_addr = parse_addr("CQRD_BIND_ADDR", "0.0.0.0:3100")?;
    let log_level = or_default("CQRD_LOG_LEVEL", "info");
    let templates_path = PathBuf::from(or_default(
        "CQRD_TEMPLATES_PATH",
        "./config/templates.yaml",
    ));

    let source_timeout_secs = parse_u64("CQRD_SOURCE_TIMEOUT_SECS", "30")?;
    let source_max_retries = parse_u32("CQRD_SOURCE_MAX_RETRIES", "3")?;
    let source_backoff_base_ms = parse_u64("CQRD_SOURCE_BACKOFF_BASE_MS", "1000")?;

    let validation_ttl_secs = parse_u64("CQRD_VALIDATION_TTL_SECS", "300")?;
    let link_ttl_secs = parse_u64("CQRD_LINK_TTL_SECS", "600")?;
    let metrics_ttl_secs = parse_u64("CQRD_METRICS_TTL_SECS", "120")?;
    let aggregate_ttl_secs = parse_u64("CQRD_AGGREGATE_TTL_SECS", "300")?;
    let cache_sweep_secs = parse_u64("CQRD_CACHE_SWEEP_SECS", "60")?;

    let scheduler_tick_secs = parse_u64("CQRD_SCHEDULER_TICK_SECS", "30")?;
    let max_stored_reports = parse_usize("CQRD_MAX_STORED_REPORTS", "200")?;

    let link_check_urls = or_default("CQRD_LINK_CHECK_URLS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    let link_check_cadence = or_default("CQRD_LINK_CHECK_CADENCE", "daily");

    Ok(AppConfig {
        source_url,
        source_api_key,
        env,
        bind_addr,
        log_level,
        templates_path,
        source_timeout_secs,
        source_max_retries,
        source_backoff_base_ms,
        validation_ttl_secs,
        link_ttl_secs,
        metrics_ttl_secs,
        aggregate_ttl_secs,
        cache_sweep_secs,
        scheduler_tick_secs,
        max_stored_reports,
        link_check_urls,
        link_check_cadence,
    })
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
mod tests {
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

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("CQRD_SOURCE_URL", "http://content-api.internal:8080");
        m
    }

    #[test]
    fn parse_environment_development() {
        assert_eq!(parse_environment("development"), Environment::Development);
    }

    #[test]
    fn parse_environment_test() {
        assert_eq!(parse_environment("test"), Environment::Test);
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_fails_without_source_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CQRD_SOURCE_URL"),
            "expected MissingEnvVar(CQRD_SOURCE_URL), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("CQRD_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CQRD_BIND_ADDR"),
            "expected InvalidEnvVar(CQRD_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_all_required_vars() {
        let map = full_env();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3100");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.source_api_key.is_none());
        assert_eq!(cfg.source_timeout_secs, 30);
        assert_eq!(cfg.source_max_retries, 3);
        assert_eq!(cfg.source_backoff_base_ms, 1000);
        assert_eq!(cfg.validation_ttl_secs, 300);
        assert_eq!(cfg.link_ttl_secs, 600);
        assert_eq!(cfg.metrics_ttl_secs, 120);
        assert_eq!(cfg.aggregate_ttl_secs, 300);
        assert_eq!(cfg.cache_sweep_secs, 60);
        assert_eq!(cfg.scheduler_tick_secs, 30);
        assert_eq!(cfg.max_stored_reports, 200);
        assert!(cfg.link_check_urls.is_empty());
        assert_eq!(cfg.link_check_cadence, "daily");
    }

    #[test]
    fn build_app_config_ttl_overrides() {
        let mut map = full_env();
        map.insert("CQRD_VALIDATION_TTL_SECS", "60");
        map.insert("CQRD_LINK_TTL_SECS", "120");
        map.insert("CQRD_METRICS_TTL_SECS", "30");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.validation_ttl_secs, 60);
        assert_eq!(cfg.link_ttl_secs, 120);
        assert_eq!(cfg.metrics_ttl_secs, 30);
    }

    #[test]
    fn build_app_config_invalid_ttl_is_rejected() {
        let mut map = full_env();
        map.insert("CQRD_VALIDATION_TTL_SECS", "five minutes");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CQRD_VALIDATION_TTL_SECS"),
            "expected InvalidEnvVar(CQRD_VALIDATION_TTL_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_invalid_scheduler_tick_is_rejected() {
        let mut map = full_env();
        map.insert("CQRD_SCHEDULER_TICK_SECS", "-1");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CQRD_SCHEDULER_TICK_SECS"),
            "expected InvalidEnvVar(CQRD_SCHEDULER_TICK_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_reads_api_key_when_present() {
        let mut map = full_env();
        map.insert("CQRD_SOURCE_API_KEY", "secret-token");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.source_api_key.as_deref(), Some("secret-token"));
    }

    #[test]
    fn build_app_config_splits_link_check_urls() {
        let mut map = full_env();
        map.insert(
            "CQRD_LINK_CHECK_URLS",
            "https://a.test/page, https://b.test/page ,",
        );
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.link_check_urls,
            vec!["https://a.test/page", "https://b.test/page"]
        );
    }

    #[test]
    fn app_config_debug_redacts_api_key() {
        let mut map = full_env();
        map.insert("CQRD_SOURCE_API_KEY", "secret-token");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[redacted]"));
    }
}
