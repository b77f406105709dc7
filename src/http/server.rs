//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router for the configured route mode
//! - Wire up middleware (tracing, inbound timeout, body limit, rate limiting)
//! - Bind server to listener with graceful shutdown
//! - Run the per-request pipeline: bypass check, forward, relay

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    middleware,
    response::Response,
    routing::{on, MethodFilter},
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ProxyConfig, RouteMode};
use crate::error::ProxyError;
use crate::forward::ForwardingEngine;
use crate::http::request::InboundRequest;
use crate::http::response;
use crate::observability::{logging::preview, metrics};
use crate::security::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::security::{ClientIdentity, RateLimiter, SecretBypass};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
    pub bypass: Arc<SecretBypass>,
}

/// HTTP server for the relay proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit)?);
        let engine = Arc::new(ForwardingEngine::new(&config.upstream, config.routing.mode)?);
        let bypass = Arc::new(SecretBypass::from_config(&config.security));

        tracing::info!(
            rate_limit = %limiter.limit(),
            rate_limit_enabled = limiter.is_enabled(),
            bypass_enabled = bypass.is_enabled(),
            "Request pipeline ready"
        );

        let state = AppState { engine, bypass };
        let rate_state = RateLimitState {
            limiter: limiter.clone(),
            trust_forwarded_for: config.rate_limit.trust_forwarded_for,
        };

        let router = Self::build_router(&config, state, rate_state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, rate_state: RateLimitState) -> Router {
        let methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE);

        let routes = match config.routing.mode {
            RouteMode::Wildcard => Router::new()
                .route("/", on(methods, proxy_handler))
                .route("/{*path}", on(methods, proxy_handler)),
            RouteMode::Fixed => Router::new().route(&config.routing.fixed_path, on(methods, proxy_handler)),
        };

        routes
            .route_layer(middleware::from_fn_with_state(rate_state, rate_limit_middleware))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            destination = %self.config.upstream.destination_url,
            mode = ?self.config.routing.mode,
            "HTTP server starting"
        );

        let sweeper = tokio::spawn(self.limiter.clone().run_sweeper(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

}

/// Main proxy handler.
/// Runs after the rate limiter admitted the request.
async fn proxy_handler(
    State(state): State<AppState>,
    Extension(client): Extension<ClientIdentity>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let span = tracing::info_span!("proxy", request_id = %Uuid::new_v4(), client = %client);

    async move {
        let method_str = method.to_string();

        if state.bypass.matches(uri.path()) {
            tracing::info!(method = %method, path = %uri.path(), "Secret key matched, skipping forwarding");
            metrics::record_bypass();
            metrics::record_request(&method_str, 200, "bypass", start_time);
            return response::bypass(state.bypass.message());
        }

        let inbound = InboundRequest::from_parts(method, &uri, &headers, body, client);
        tracing::info!(method = %inbound.method, path = %inbound.path, "Received request");
        tracing::debug!(headers = ?inbound.headers, cookies = ?inbound.cookies, "Request headers");
        tracing::debug!(body = %preview(&inbound.body), "Request body");

        let result = state.engine.forward(&inbound).await;
        let outcome = result.label();
        let response = response::from_outcome(result);

        metrics::record_request(&method_str, response.status().as_u16(), outcome, start_time);
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn config(mode: RouteMode) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        // Nothing listens here; anything forwarded fails fast.
        config.upstream.destination_url = "http://127.0.0.1:9".to_string();
        config.upstream.timeout_secs = 2;
        config.routing.mode = mode;
        config.security.secret_key = Some("goruboe".to_string());
        config.rate_limit.limit = "2 per minute".to_string();
        config
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn bypass_short_circuits_after_rate_limit() {
        let router = HttpServer::new(config(RouteMode::Wildcard)).unwrap().router;

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(request(Method::DELETE, "/hooks/goruboe"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"Request received successfully");
        }

        // Without ConnectInfo every caller shares the "unknown" bucket.
        let response = router
            .oneshot(request(Method::GET, "/hooks/goruboe"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn unsupported_methods_are_rejected() {
        let router = HttpServer::new(config(RouteMode::Wildcard)).unwrap().router;
        let response = router.oneshot(request(Method::PATCH, "/test")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn fixed_mode_only_serves_fixed_path() {
        let router = HttpServer::new(config(RouteMode::Fixed)).unwrap().router;
        let response = router.oneshot(request(Method::GET, "/other")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bypass_applies_in_fixed_mode() {
        let mut config = config(RouteMode::Fixed);
        config.routing.fixed_path = "/hooks/goruboe".to_string();
        let router = HttpServer::new(config).unwrap().router;

        let response = router.oneshot(request(Method::POST, "/hooks/goruboe")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Request received successfully");
    }

    #[tokio::test]
    async fn unreachable_destination_yields_502() {
        let router = HttpServer::new(config(RouteMode::Wildcard)).unwrap().router;
        let response = router.oneshot(request(Method::GET, "/test")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = config(RouteMode::Wildcard);
        config.security.max_body_size = 16;
        let router = HttpServer::new(config).unwrap().router;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header("content-length", "64")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
