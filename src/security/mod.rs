//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (resolve client key from peer / X-Forwarded-For)
//!     → rate_limit.rs (per-client quota, 429 on exhaustion)
//!     → bypass.rs (secret in path short-circuits forwarding)
//!     → Pass to forwarding engine
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before any other work, including the bypass
//! - Limiter state is injected, never global
//! - Unresolvable identities share the "unknown" bucket instead of failing

pub mod bypass;
pub mod identity;
pub mod rate_limit;

pub use bypass::SecretBypass;
pub use identity::ClientIdentity;
pub use rate_limit::{Admission, RateLimit, RateLimiter};
