//! Per-client fixed-window rate limiting.
//!
//! # Responsibilities
//! - Parse the configured quota string ("10 per minute", "100/hour")
//! - Count admitted requests per client identity within the current window
//! - Reject over-quota requests with 429 before any forwarding happens
//! - Evict counters whose window has expired

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::schema::RateLimitConfig;
use crate::error::GatewayError;
use crate::observability::metrics;
use crate::security::identity::ClientIdentity;

/// Error returned when a quota string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitParseError {
    #[error("rate limit is empty")]
    Empty,
    #[error("rate limit '{0}' must look like '<N> per <unit>' or '<N>/<unit>'")]
    MissingSeparator(String),
    #[error("invalid request count '{0}'")]
    InvalidCount(String),
    #[error("request count must be at least 1")]
    ZeroQuota,
    #[error("invalid window multiplier '{0}'")]
    InvalidMultiplier(String),
    #[error("unknown time unit '{0}', expected second, minute, hour or day")]
    UnknownUnit(String),
}

/// Granularity of a rate limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    fn seconds(self) -> u64 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 3600,
            TimeUnit::Day => 86400,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "sec" | "second" | "seconds" => Ok(TimeUnit::Second),
            "m" | "min" | "minute" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            "d" | "day" | "days" => Ok(TimeUnit::Day),
            other => Err(RateLimitParseError::UnknownUnit(other.to_string())),
        }
    }
}

/// A quota of `quota` requests per `multiplier` x `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    quota: u32,
    multiplier: u32,
    unit: TimeUnit,
}

impl RateLimit {
    pub fn new(quota: u32, multiplier: u32, unit: TimeUnit) -> Self {
        Self { quota, multiplier, unit }
    }

    /// Maximum admitted requests per window.
    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.unit.seconds() * u64::from(self.multiplier))
    }
}

impl FromStr for RateLimit {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(RateLimitParseError::Empty);
        }

        let (count, period) = normalized
            .split_once('/')
            .or_else(|| normalized.split_once(" per "))
            .ok_or_else(|| RateLimitParseError::MissingSeparator(s.trim().to_string()))?;

        let count = count.trim();
        let quota: u32 = count
            .parse()
            .map_err(|_| RateLimitParseError::InvalidCount(count.to_string()))?;
        if quota == 0 {
            return Err(RateLimitParseError::ZeroQuota);
        }

        let tokens: Vec<&str> = period.split_whitespace().collect();
        let (multiplier, unit) = match tokens.as_slice() {
            [unit] => (1, unit.parse::<TimeUnit>()?),
            [multiplier, unit] => {
                let multiplier = multiplier
                    .parse::<u32>()
                    .ok()
                    .filter(|m| *m > 0)
                    .ok_or_else(|| RateLimitParseError::InvalidMultiplier(multiplier.to_string()))?;
                (multiplier, unit.parse::<TimeUnit>()?)
            }
            _ => return Err(RateLimitParseError::MissingSeparator(s.trim().to_string())),
        };

        Ok(Self::new(quota, multiplier, unit))
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per {} {}", self.quota, self.multiplier, self.unit.name())
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was counted; `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// The quota is exhausted until the window resets.
    Denied { retry_after: Duration },
}

/// Counter for one client within one window.
#[derive(Debug)]
struct WindowCounter {
    started: Instant,
    count: u32,
}

/// Shared per-client rate limiter.
///
/// Each identity gets a fixed window that starts with its first request.
/// The counter is updated while holding the map shard lock for that key, so
/// concurrent admissions for the same client never exceed the quota.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    enabled: bool,
    windows: DashMap<ClientIdentity, WindowCounter>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            enabled: true,
            windows: DashMap::new(),
        }
    }

    /// A limiter that admits everything.
    pub fn disabled(limit: RateLimit) -> Self {
        Self {
            enabled: false,
            ..Self::new(limit)
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitParseError> {
        let limit: RateLimit = config.limit.parse()?;
        Ok(if config.enabled {
            Self::new(limit)
        } else {
            Self::disabled(limit)
        })
    }

    pub fn limit(&self) -> &RateLimit {
        &self.limit
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count a request from `identity` against its quota.
    pub fn admit(&self, identity: &ClientIdentity) -> Admission {
        self.admit_at(identity, Instant::now())
    }

    /// Same as [`RateLimiter::admit`] with an explicit clock reading.
    pub fn admit_at(&self, identity: &ClientIdentity, now: Instant) -> Admission {
        if !self.enabled {
            return Admission::Allowed {
                remaining: self.limit.quota,
            };
        }

        let window = self.limit.window();
        let mut entry = self
            .windows
            .entry(identity.clone())
            .or_insert_with(|| WindowCounter { started: now, count: 0 });
        let counter = entry.value_mut();

        let elapsed = now.saturating_duration_since(counter.started);
        if elapsed >= window {
            counter.started = now;
            counter.count = 0;
        }

        if counter.count < self.limit.quota {
            counter.count += 1;
            Admission::Allowed {
                remaining: self.limit.quota - counter.count,
            }
        } else {
            let elapsed = now.saturating_duration_since(counter.started);
            Admission::Denied {
                retry_after: window.saturating_sub(elapsed),
            }
        }
    }

    /// Drop counters whose window ended before `now`. Returns how many were removed.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let window = self.limit.window();
        let before = self.windows.len();
        self.windows
            .retain(|_, counter| now.saturating_duration_since(counter.started) < window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Periodically evict expired counters until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            return;
        }

        let mut interval = tokio::time::interval(self.limit.window());
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.evict_expired(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            tracked = self.tracked_clients(),
                            "Evicted expired rate limit windows"
                        );
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }
}

/// State handed to [`rate_limit_middleware`].
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub trust_forwarded_for: bool,
}

/// Middleware that resolves the caller's identity and enforces its quota.
///
/// Admitted requests carry the resolved [`ClientIdentity`] as an extension.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = ClientIdentity::resolve(peer, request.headers(), state.trust_forwarded_for);

    match state.limiter.admit(&identity) {
        Admission::Allowed { remaining } => {
            tracing::trace!(client = %identity, remaining, "Request admitted");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Admission::Denied { retry_after } => {
            tracing::warn!(
                client = %identity,
                method = %request.method(),
                path = %request.uri().path(),
                limit = %state.limiter.limit(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            GatewayError::QuotaExceeded {
                limit: state.limiter.limit().to_string(),
                retry_after,
            }
            .into_response()
        }
    }
}
