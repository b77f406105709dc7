//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the destination is an absolute http(s) URL
//! - Check the rate limit string parses
//! - Validate value ranges (timeouts > 0, retention >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, RouteMode};
use crate::security::rate_limit::RateLimit;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.upstream.destination_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => errors.push(ValidationError::new(
            "upstream.destination_url",
            format!("unsupported destination '{}', expected an http(s) URL", url),
        )),
        Err(e) => errors.push(ValidationError::new(
            "upstream.destination_url",
            format!("'{}' is not a valid URL: {}", config.upstream.destination_url, e),
        )),
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else if config.timeouts.request_secs <= config.upstream.timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than upstream.timeout_secs so upstream timeouts surface as 504",
        ));
    }

    if let Err(e) = config.rate_limit.limit.parse::<RateLimit>() {
        errors.push(ValidationError::new("rate_limit.limit", e.to_string()));
    }

    if config.routing.mode == RouteMode::Fixed && !config.routing.fixed_path.starts_with('/') {
        errors.push(ValidationError::new("routing.fixed_path", "must start with '/'"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if config.logging.retention_days == 0 {
        errors.push(ValidationError::new("logging.retention_days", "must be at least 1"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
