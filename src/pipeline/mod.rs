//! Backend handler pipeline.
//!
//! # Data Flow
//! ```text
//! HandlerBuilder (immutable, derivations return new builders)
//!     → build(path)
//!     → BackendHandler
//!
//! per inbound request:
//!     InboundEvent
//!     → body.rs (BodyProvider)
//!     → request.rs (RequestDescription)
//!     → extender.rs (ExtenderChain, in registration order)
//!     → fetcher.rs (Fetcher, aborts on disconnect)
//!     → transformer.rs (ResponseTransformer chain)
//!     → T | NormalizedError
//! ```
//!
//! # Design Decisions
//! - Each stage is an `Arc`'d async function so builders clone cheaply
//! - Configuration comes from an injected [`BackendContext`]
//! - Illegal stage replacements are rejected at compile time by the
//!   builder's state parameter

pub mod body;
pub mod builder;
pub mod context;
pub mod event;
pub mod extender;
pub mod fetcher;
pub mod handler;
pub mod method;
pub mod request;
pub mod transformer;

use serde::{de::DeserializeOwned, Serialize};

pub use body::{body_provider, default_body_provider, extract_event_body, no_body, BodyProvider};
pub use builder::{
    backend_handler_builder, BodyBound, BuilderState, FetcherReplaceable, HandlerBuilder,
    PipelineConfig, Sealed, Unbound,
};
pub use context::BackendContext;
pub use event::{InboundEvent, DEFAULT_BODY_LIMIT, X_REQUEST_ID};
pub use extender::{option_extender, ExtenderChain, OptionExtender};
pub use fetcher::{default_fetcher, fetch_json, fetcher, Fetcher};
pub use handler::{BackendHandler, MISSING_API_URL};
pub use method::{FetchMethod, UnsupportedMethod};
pub use request::RequestDescription;
pub use transformer::{compose, identity_transformer, ResponseTransformer};

/// Types that can travel as an outbound request body.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}
