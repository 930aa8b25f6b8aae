//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout layers)
//!     → routes.rs (RouteTable: path + method → compiled BackendHandler)
//!     → BackendHandler::serve (pipeline run, JSON or normalized error)
//!     → Send to client
//! ```

pub mod routes;
pub mod server;

pub use routes::RouteTable;
pub use server::HttpServer;
