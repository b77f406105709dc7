//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace/timeout/body-limit layers)
//!     → security rate limiter (route layer)
//!     → server.rs handler (secret bypass, build InboundRequest)
//!     → forwarding engine
//!     → response.rs (filtered relay or fixed error body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{HeaderList, InboundRequest};
pub use server::HttpServer;
