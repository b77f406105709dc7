//! Minimal rate-limited HTTP relay proxy library.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{GatewayError, ProxyError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
