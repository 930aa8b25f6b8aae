//! Session and token shapes returned by an identity provider.

use serde::{Deserialize, Serialize};

/// Marker the session layer sets when it could not refresh the access token.
pub const REFRESH_ACCESS_TOKEN_ERROR: &str = "RefreshAccessTokenError";

/// Server-side session for the inbound caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Access token for the backend API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_access_token: Option<String>,

    /// Set when the session layer failed (e.g. refresh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Session {
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            api_access_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn refresh_failed(&self) -> bool {
        self.error.as_deref() == Some(REFRESH_ACCESS_TOKEN_ERROR)
    }

    /// The backend access token, if present and non-empty.
    pub fn access_token(&self) -> Option<&str> {
        self.api_access_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Decoded session token. Claims are taken as the provider reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_marker_is_detected() {
        let session = Session {
            error: Some(REFRESH_ACCESS_TOKEN_ERROR.into()),
            ..Session::default()
        };
        assert!(session.refresh_failed());
        assert!(!Session::with_access_token("abc").refresh_failed());
    }

    #[test]
    fn empty_access_token_is_absent() {
        assert_eq!(Session::with_access_token("").access_token(), None);
        assert_eq!(Session::with_access_token("abc").access_token(), Some("abc"));
    }

    #[test]
    fn session_uses_camel_case_fields() {
        let session: Session =
            serde_json::from_str(r#"{"apiAccessToken":"abc","error":"RefreshAccessTokenError"}"#)
                .unwrap();
        assert_eq!(session.access_token(), Some("abc"));
        assert!(session.refresh_failed());
    }
}
