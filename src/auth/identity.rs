//! Identity providers: where sessions and tokens come from.

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;

use super::session::{Session, Token};
use crate::error::ProxyResult;
use crate::pipeline::InboundEvent;

/// Resolves the caller's session and token from an inbound request.
///
/// Implementations own token refresh; a failed refresh is reported through
/// the session's error marker, never by refreshing again downstream.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_session(&self, event: &InboundEvent) -> ProxyResult<Option<Session>>;

    async fn resolve_token(&self, event: &InboundEvent) -> ProxyResult<Option<Token>>;
}

/// Returns the same session and token for every request.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    session: Option<Session>,
    token: Option<Token>,
}

impl StaticIdentityProvider {
    pub fn new(session: Option<Session>, token: Option<Token>) -> Self {
        Self { session, token }
    }

    /// A signed-in caller holding `access_token`.
    pub fn authenticated(access_token: impl Into<String>) -> Self {
        Self::new(Some(Session::with_access_token(access_token)), Some(Token::default()))
    }

    /// No session at all.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve_session(&self, _event: &InboundEvent) -> ProxyResult<Option<Session>> {
        Ok(self.session.clone())
    }

    async fn resolve_token(&self, _event: &InboundEvent) -> ProxyResult<Option<Token>> {
        Ok(self.token.clone())
    }
}

/// Treats an inbound `Authorization: Bearer <token>` credential as an
/// already-refreshed session holding that access token.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerPassthroughProvider;

impl BearerPassthroughProvider {
    fn bearer(event: &InboundEvent) -> Option<String> {
        let value = event.header(AUTHORIZATION.as_str())?.trim();
        let (scheme, token) = value.split_once(' ')?;
        scheme
            .eq_ignore_ascii_case("bearer")
            .then(|| token.trim().to_string())
    }
}

#[async_trait]
impl IdentityProvider for BearerPassthroughProvider {
    async fn resolve_session(&self, event: &InboundEvent) -> ProxyResult<Option<Session>> {
        Ok(Self::bearer(event).map(Session::with_access_token))
    }

    async fn resolve_token(&self, event: &InboundEvent) -> ProxyResult<Option<Token>> {
        Ok(Self::bearer(event).map(|_| Token {
            provider: Some("bearer".to_string()),
            ..Token::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri};

    fn event(authorization: Option<&'static str>) -> InboundEvent {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        InboundEvent::new(Method::GET, Uri::from_static("/"), headers, Bytes::new())
    }

    #[tokio::test]
    async fn passthrough_reads_bearer_credential() {
        let provider = BearerPassthroughProvider;
        let session = provider
            .resolve_session(&event(Some("Bearer abc")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.access_token(), Some("abc"));

        let token = provider.resolve_token(&event(Some("bearer abc"))).await.unwrap();
        assert_eq!(token.and_then(|t| t.provider).as_deref(), Some("bearer"));
    }

    #[tokio::test]
    async fn passthrough_ignores_other_schemes() {
        let provider = BearerPassthroughProvider;
        assert!(provider.resolve_session(&event(None)).await.unwrap().is_none());
        assert!(provider
            .resolve_session(&event(Some("Basic dXNlcjpwdw==")))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn static_provider_returns_fixed_values() {
        let provider = StaticIdentityProvider::authenticated("xyz");
        let session = provider.resolve_session(&event(None)).await.unwrap().unwrap();
        assert_eq!(session.access_token(), Some("xyz"));
        assert!(provider.resolve_token(&event(None)).await.unwrap().is_some());

        let anonymous = StaticIdentityProvider::anonymous();
        assert!(anonymous.resolve_session(&event(None)).await.unwrap().is_none());
    }
}
