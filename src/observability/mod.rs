//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Compiled handlers and the HTTP server produce:
//!     → logging.rs (structured log events, request ID on every line)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows from the inbound header to the backend call
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
