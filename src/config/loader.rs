//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ProxyConfig, RouteMode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read .env file: {0}")]
    Dotenv(String),

    #[error("invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the effective configuration.
///
/// Defaults, then the optional TOML file, then a `.env` file in the working
/// directory (if any), then process environment variables. The result is validated.
pub fn load(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(ConfigError::Dotenv(e.to_string()));
        }
    }

    resolve(path, |name| std::env::var(name).ok())
}

fn resolve<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply the environment variables the proxy understands on top of `config`.
///
/// `lookup` abstracts the environment so callers can pass any source.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DESTINATION_URL") {
        config.upstream.destination_url = url;
    }
    if let Some(secret) = lookup("SECRET_KEY") {
        config.security.secret_key = Some(secret).filter(|s| !s.is_empty());
    }
    if let Some(limit) = lookup("RATE_LIMIT") {
        config.rate_limit.limit = limit;
    }
    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_env("PORT", &port)?;
    }
    if let Some(debug) = lookup("DEBUG") {
        config.logging.debug = parse_bool("DEBUG", &debug)?;
    }
    if let Some(mode) = lookup("ROUTE_MODE") {
        config.routing.mode = mode
            .parse::<RouteMode>()
            .map_err(|reason| ConfigError::Env { name: "ROUTE_MODE", reason })?;
    }
    if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse_env("UPSTREAM_TIMEOUT_SECS", &secs)?;
    }
    if let Some(dir) = lookup("LOG_DIR") {
        config.logging.directory = Some(dir).filter(|d| !d.is_empty());
    }
    if let Some(days) = lookup("LOG_RETENTION_DAYS") {
        config.logging.retention_days = parse_env("LOG_RETENTION_DAYS", &days)?;
    }
    Ok(())
}

fn parse_env<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        name,
        reason: format!("'{}': {}", value, e),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Env {
            name,
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_documented_variables() {
        let mut config = ProxyConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("DESTINATION_URL", "http://backend:8080"),
                ("SECRET_KEY", "goruboe"),
                ("RATE_LIMIT", "5 per second"),
                ("PORT", "8000"),
                ("DEBUG", "True"),
                ("ROUTE_MODE", "fixed"),
                ("LOG_RETENTION_DAYS", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.destination_url, "http://backend:8080");
        assert_eq!(config.security.secret_key.as_deref(), Some("goruboe"));
        assert_eq!(config.rate_limit.limit, "5 per second");
        assert_eq!(config.listener.port, 8000);
        assert!(config.logging.debug);
        assert_eq!(config.routing.mode, RouteMode::Fixed);
        assert_eq!(config.logging.retention_days, 7);
    }

    #[test]
    fn empty_secret_disables_bypass() {
        let mut config = ProxyConfig::default();
        config.security.secret_key = Some("from-file".into());
        apply_env_overrides(&mut config, env(&[("SECRET_KEY", "")])).unwrap();
        assert!(config.security.secret_key.is_none());
    }

    #[test]
    fn bad_port_is_reported_by_name() {
        let mut config = ProxyConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "PORT", .. }));
    }

    #[test]
    fn bad_debug_flag_is_rejected() {
        let mut config = ProxyConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("DEBUG", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "DEBUG", .. }));
    }

    #[test]
    fn file_values_are_read_then_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [upstream]
            destination_url = "http://127.0.0.1:9000"

            [rate_limit]
            limit = "100/hour"
            "#
        )
        .unwrap();

        let config = resolve(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.upstream.destination_url, "http://127.0.0.1:9000");
        assert_eq!(config.rate_limit.limit, "100/hour");

        let config = resolve(Some(file.path()), env(&[("RATE_LIMIT", "3 per second")])).unwrap();
        assert_eq!(config.upstream.destination_url, "http://127.0.0.1:9000");
        assert_eq!(config.rate_limit.limit, "3 per second");
    }

    #[test]
    fn invalid_file_surfaces_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rate_limit]\nlimit = \"often\"").unwrap();

        match resolve(Some(file.path()), env(&[])) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors[0].field, "rate_limit.limit"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
