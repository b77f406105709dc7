//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (admitted, not bypassed)
//!     → engine.rs (build URL + headers, single attempt, upstream timeout)
//!     → outcome.rs (Success | Timeout | ConnectionFailure | TransportError | DestinationNotFound)
//!     → http/response.rs (filtered relay or fixed JSON error)
//! ```
//!
//! # Design Decisions
//! - No retries and no redirect following
//! - Failures are values, not panics; nothing escapes the engine
//! - Dropping the forward future cancels the in-flight call

pub mod engine;
pub mod outcome;

pub use engine::ForwardingEngine;
pub use outcome::{OutboundResult, UpstreamResponse, FRAMING_HEADERS};
