//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl+C / test harness
//!     → Shutdown::trigger (broadcast)
//!     → HttpServer stops accepting, drains in-flight requests
//!     → process exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - In-flight handlers finish; their backend calls are not cancelled by shutdown

pub mod shutdown;

pub use shutdown::Shutdown;
