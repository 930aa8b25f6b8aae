//! Auth context resolution for a single inbound request.

use super::identity::IdentityProvider;
use super::session::{Session, Token};
use crate::error::{ProxyError, ProxyResult};
use crate::pipeline::InboundEvent;

/// Authenticated caller: session, token and the backend access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub session: Session,
    pub token: Token,
    pub access_token: String,
}

/// Resolve the auth context or fail with a 401-class error.
///
/// Checks, in order: refresh-failure marker, missing session or token,
/// missing or empty access token. Never refreshes.
pub async fn resolve_auth_context(
    provider: &dyn IdentityProvider,
    event: &InboundEvent,
) -> ProxyResult<AuthContext> {
    let session = provider.resolve_session(event).await?;
    let token = provider.resolve_token(event).await?;

    if session.as_ref().is_some_and(Session::refresh_failed) {
        return Err(ProxyError::AuthRefresh);
    }

    let (Some(session), Some(token)) = (session, token) else {
        return Err(ProxyError::Unauthenticated);
    };

    let access_token = session
        .access_token()
        .ok_or(ProxyError::Unauthenticated)?
        .to_string();

    Ok(AuthContext {
        session,
        token,
        access_token,
    })
}
