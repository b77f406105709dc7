//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// The single fixed destination requests are relayed to.
    pub upstream: UpstreamConfig,

    /// Which inbound paths are proxied.
    pub routing: RoutingConfig,

    /// Secret bypass and body limits.
    pub security: SecurityConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Console and rotating file logs.
    pub logging: LoggingConfig,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,
}

impl ProxyConfig {
    /// Placeholder written over the secret in [`ProxyConfig::redacted`].
    pub const REDACTED: &'static str = "<redacted>";

    /// Copy safe to print: the bypass secret is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.security.secret_key.is_some() {
            config.security.secret_key = Some(Self::REDACTED.to_string());
        }
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
        }
    }
}

/// Destination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the destination (e.g., "https://example.com/api").
    pub destination_url: String,

    /// Timeout for a single outbound call, in seconds.
    pub timeout_secs: u64,

    /// Honor HTTP_PROXY/HTTPS_PROXY when talking to the destination.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            destination_url: "https://example.com/api".to_string(),
            timeout_secs: 10,
            use_system_proxy: false,
        }
    }
}

/// How inbound paths map onto the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Every path is proxied; the inbound path is appended to the destination
    /// and a destination 404 is replaced by a synthesized one.
    #[default]
    Wildcard,
    /// Only `fixed_path` is proxied; the destination URL is used verbatim and
    /// every destination status is relayed unchanged.
    Fixed,
}

impl std::str::FromStr for RouteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wildcard" => Ok(Self::Wildcard),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("unknown route mode '{}', expected 'wildcard' or 'fixed'", other)),
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Wildcard or fixed-path operation.
    pub mode: RouteMode,

    /// The single proxied path in fixed mode.
    pub fixed_path: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RouteMode::Wildcard,
            fixed_path: "/receive".to_string(),
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Token that, when found anywhere in the request path, short-circuits forwarding.
    pub secret_key: Option<String>,

    /// Body returned for a bypassed request.
    pub bypass_message: String,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            bypass_message: "Request received successfully".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Quota string, e.g. "10 per minute" or "100/hour".
    pub limit: String,

    /// Key clients by the right-most X-Forwarded-For entry instead of the peer address.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: "10 per minute".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Verbose mode: debug-level logs including headers and bodies.
    pub debug: bool,

    /// Directory for the rotating log files. `None` disables file logging.
    pub directory: Option<String>,

    /// File name prefix; files are named `<prefix>.<date>.log`.
    pub file_prefix: String,

    /// Number of daily files kept.
    pub retention_days: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            directory: Some("logs".to_string()),
            file_prefix: "proxy".to_string(),
            retention_days: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}
