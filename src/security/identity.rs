//! Client identity used as the rate limit key.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The value a caller is counted under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Identity used when the caller's address cannot be determined.
    const UNKNOWN: &'static str = "unknown";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    /// Identity of a directly connected peer (port is ignored).
    pub fn from_peer(addr: SocketAddr) -> Self {
        Self(addr.ip().to_string())
    }

    /// Resolve the identity for a request.
    ///
    /// With `trust_forwarded_for`, the right-most `X-Forwarded-For` entry names the
    /// client (one trusted proxy hop). Anything unparseable maps to [`Self::unknown`].
    pub fn resolve(peer: Option<SocketAddr>, headers: &HeaderMap, trust_forwarded_for: bool) -> Self {
        if trust_forwarded_for {
            if let Some(value) = headers.get_all(X_FORWARDED_FOR).iter().last() {
                return value
                    .to_str()
                    .ok()
                    .and_then(|v| v.rsplit(',').next())
                    .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
                    .map(|ip| Self(ip.to_string()))
                    .unwrap_or_else(Self::unknown);
            }
        }

        peer.map(Self::from_peer).unwrap_or_else(Self::unknown)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
