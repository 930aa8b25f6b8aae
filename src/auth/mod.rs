//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! InboundEvent
//!     → identity.rs (IdentityProvider: session + token)
//!     → context.rs (refresh marker → 401, missing session/token → 401,
//!                   missing access token → 401)
//!     → handler.rs (bearer extender: Authorization: Bearer <token>)
//! ```
//!
//! # Design Decisions
//! - Session refresh belongs to the identity provider; resolution never refreshes
//! - Auth is an ordinary extender, so it composes with any builder state

pub mod context;
pub mod handler;
pub mod identity;
pub mod session;

pub use context::{resolve_auth_context, AuthContext};
pub use handler::{
    auth_handler, define_backend_handler, with_bearer_auth, HandlerDefinition,
    AUTHORIZATION_HEADER,
};
pub use identity::{BearerPassthroughProvider, IdentityProvider, StaticIdentityProvider};
pub use session::{Session, SessionUser, Token, REFRESH_ACCESS_TOKEN_ERROR};
