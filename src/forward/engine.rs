//! Forwarding engine: one outbound attempt per admitted request.
//!
//! # Responsibilities
//! - Build the destination URL for a request
//! - Copy method, headers (minus `Host`) and body onto the outbound request
//! - Enforce the upstream timeout, never follow redirects, never retry
//! - Classify the result into an [`OutboundResult`]

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::redirect::Policy;

use crate::config::schema::{RouteMode, UpstreamConfig};
use crate::forward::outcome::{OutboundResult, UpstreamResponse};
use crate::http::request::{HeaderList, InboundRequest};
use crate::observability::logging::preview;

/// Relays admitted requests to the fixed destination.
#[derive(Debug, Clone)]
pub struct ForwardingEngine {
    client: reqwest::Client,
    destination: String,
    mode: RouteMode,
}

impl ForwardingEngine {
    pub fn new(config: &UpstreamConfig, mode: RouteMode) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            destination: config.destination_url.clone(),
            mode,
        })
    }

    /// URL the request is sent to.
    ///
    /// Wildcard mode appends the inbound path and query to the destination as
    /// plain text; fixed mode uses the destination verbatim.
    pub fn target_url(&self, request: &InboundRequest) -> String {
        match self.mode {
            RouteMode::Fixed => self.destination.clone(),
            RouteMode::Wildcard => join_url(&self.destination, &request.path_and_query()),
        }
    }

    /// Send `request` to the destination and classify what came back.
    pub async fn forward(&self, request: &InboundRequest) -> OutboundResult {
        let url = self.target_url(request);
        let method = request.method.clone();

        let outbound = self
            .client
            .request(method.clone(), &url)
            .headers(outbound_headers(request))
            .body(request.body.clone());

        tracing::info!(method = %method, url = %url, "Forwarding request");

        let response = match outbound.send().await {
            Ok(response) => response,
            Err(e) => return self.failed(&method, &url, &e),
        };

        let status = response.status();
        let headers = HeaderList::from(response.headers());
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return self.failed(&method, &url, &e),
        };

        tracing::info!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            "Received response from destination"
        );
        tracing::debug!(headers = ?headers, "Response headers");
        tracing::debug!(body = %preview(&body), "Response body");

        if status == StatusCode::NOT_FOUND && self.mode == RouteMode::Wildcard {
            tracing::warn!(method = %method, url = %url, "Destination returned 404");
            return OutboundResult::DestinationNotFound;
        }

        OutboundResult::Success(UpstreamResponse { status, headers, body })
    }

    fn failed(&self, method: &Method, url: &str, error: &reqwest::Error) -> OutboundResult {
        let result = OutboundResult::from_error(error);
        match &result {
            OutboundResult::Timeout => {
                tracing::error!(method = %method, url = %url, "Timeout occurred while requesting destination");
            }
            OutboundResult::ConnectionFailure => {
                tracing::error!(method = %method, url = %url, error = %error, "Connection error occurred while requesting destination");
            }
            _ => {
                tracing::error!(method = %method, url = %url, error = %error, "Error occurred while requesting destination");
            }
        }
        result
    }
}

/// Content codings the client decodes. Anything else the destination sent
/// would reach the caller still encoded once `content-encoding` is stripped.
const DECODABLE_ENCODINGS: [&str; 5] = ["gzip", "deflate", "br", "zstd", "identity"];

/// Forwarded headers with `Accept-Encoding` narrowed to [`DECODABLE_ENCODINGS`].
fn outbound_headers(request: &InboundRequest) -> HeaderMap {
    let mut headers = request.forwarded_headers().to_header_map();
    let accepted: Vec<String> = headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|coding| {
            let name = coding.split(';').next().unwrap_or("").trim();
            DECODABLE_ENCODINGS.iter().any(|d| name.eq_ignore_ascii_case(d))
        })
        .map(str::to_string)
        .collect();

    headers.remove(header::ACCEPT_ENCODING);
    // With no header the client advertises its own decodable set.
    if !accepted.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&accepted.join(", ")) {
            headers.insert(header::ACCEPT_ENCODING, value);
        }
    }
    headers
}

/// Concatenate `base` and `path`, collapsing only a doubled `/` at the seam.
fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.strip_prefix('/')) {
        (true, Some(rest)) => format!("{}{}", base, rest),
        (false, None) if !path.is_empty() => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
