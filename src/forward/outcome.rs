//! Result of a single outbound attempt.

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::error::GatewayError;
use crate::http::request::HeaderList;

/// Headers describing the destination's own framing. They are stripped before
/// relaying because the proxy re-frames the body it sends back.
pub const FRAMING_HEADERS: [&str; 4] = [
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
];

/// A complete response read from the destination.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderList,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Destination headers minus [`FRAMING_HEADERS`].
    pub fn relayed_headers(&self) -> HeaderList {
        self.headers.without(&FRAMING_HEADERS)
    }
}

/// Exactly one of these is produced per forwarded request.
#[derive(Debug, Clone)]
pub enum OutboundResult {
    Success(UpstreamResponse),
    Timeout,
    ConnectionFailure,
    TransportError(String),
    DestinationNotFound,
}

impl OutboundResult {
    /// Classify a client error: timeout first, then connect failure, then anything else.
    pub fn from_error(error: &reqwest::Error) -> Self {
        classify(error.is_timeout(), error.is_connect(), || error.to_string())
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OutboundResult::Success(_) => "success",
            OutboundResult::Timeout => "timeout",
            OutboundResult::ConnectionFailure => "connection_failure",
            OutboundResult::TransportError(_) => "transport_error",
            OutboundResult::DestinationNotFound => "not_found",
        }
    }

    pub fn into_result(self) -> Result<UpstreamResponse, GatewayError> {
        match self {
            OutboundResult::Success(response) => Ok(response),
            OutboundResult::Timeout => Err(GatewayError::UpstreamTimeout),
            OutboundResult::ConnectionFailure => Err(GatewayError::UpstreamUnreachable),
            OutboundResult::TransportError(detail) => Err(GatewayError::UpstreamProtocol(detail)),
            OutboundResult::DestinationNotFound => Err(GatewayError::UpstreamNotFound),
        }
    }
}

fn classify(timed_out: bool, connect_failed: bool, detail: impl FnOnce() -> String) -> OutboundResult {
    if timed_out {
        OutboundResult::Timeout
    } else if connect_failed {
        OutboundResult::ConnectionFailure
    } else {
        OutboundResult::TransportError(detail())
    }
}
