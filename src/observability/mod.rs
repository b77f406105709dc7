//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events: console + daily rolling file)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log files under the configured directory, stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID and client identity flow through a per-request span
//! - File writes go through a non-blocking worker so each event lands as a whole line
//! - Metrics are cheap (atomic increments) and no-ops when the exporter is off

pub mod logging;
pub mod metrics;
