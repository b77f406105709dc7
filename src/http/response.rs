//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay a destination response with its framing headers stripped
//! - Map forwarding failures to their fixed JSON bodies
//! - Build the secret-bypass response

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::forward::{OutboundResult, UpstreamResponse};

/// Relay the destination's status, filtered headers and body unchanged.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let headers = upstream.relayed_headers();
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let target = response.headers_mut();
    for (name, value) in headers.iter() {
        target.append(name.clone(), value.clone());
    }
    response
}

/// Client response for a forwarding outcome.
pub fn from_outcome(result: OutboundResult) -> Response {
    match result.into_result() {
        Ok(upstream) => relay(upstream),
        Err(error) => error.into_response(),
    }
}

/// Fixed success response for a request that matched the secret.
pub fn bypass(message: &str) -> Response {
    (StatusCode::OK, message.to_string()).into_response()
}
