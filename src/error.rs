//! Error types for the relay proxy.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::security::rate_limit::RateLimitParseError;

/// Client-visible failure of a proxied request.
///
/// Every destination-side failure is converted into one of these at the
/// forwarding boundary; none of them propagate further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The caller exhausted its quota for the current window.
    #[error("rate limit exceeded: {limit}")]
    QuotaExceeded { limit: String, retry_after: Duration },

    /// The destination did not answer within the upstream timeout.
    #[error("request to destination timed out")]
    UpstreamTimeout,

    /// The connection to the destination could not be established.
    #[error("could not connect to destination")]
    UpstreamUnreachable,

    /// Any other transport failure. The detail is logged, never sent to the client.
    #[error("upstream transport error: {0}")]
    UpstreamProtocol(String),

    /// The destination answered 404.
    #[error("destination returned 404")]
    UpstreamNotFound,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamProtocol(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UpstreamNotFound => StatusCode::NOT_FOUND,
        }
    }

    /// The message placed in the JSON `error` field.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::QuotaExceeded { limit, .. } => format!("Rate limit exceeded: {}", limit),
            GatewayError::UpstreamTimeout => "Request to destination timed out".to_string(),
            GatewayError::UpstreamUnreachable => "Could not connect to destination".to_string(),
            GatewayError::UpstreamProtocol(_) => "An error occurred processing your request".to_string(),
            GatewayError::UpstreamNotFound => "Resource not found on the destination server".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(json!({ "error": self.client_message() }))).into_response();

        if let GatewayError::QuotaExceeded { retry_after, .. } = &self {
            // Round up so clients never retry inside the same window.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }

        response
    }
}

/// Startup failure.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid rate limit: {0}")]
    RateLimit(#[from] RateLimitParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
