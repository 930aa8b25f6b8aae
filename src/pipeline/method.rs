//! HTTP verbs a backend handler may use.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use axum::routing::MethodFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verb used for the outbound call and for default body-provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported method '{0}' (expected GET, POST, PUT or DELETE)")]
pub struct UnsupportedMethod(pub String);

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Get => "GET",
            FetchMethod::Post => "POST",
            FetchMethod::Put => "PUT",
            FetchMethod::Delete => "DELETE",
        }
    }

    /// Whether the default body provider reads the inbound body for this verb.
    pub fn expects_body(&self) -> bool {
        matches!(self, FetchMethod::Post | FetchMethod::Put)
    }

    pub fn to_http(&self) -> Method {
        match self {
            FetchMethod::Get => Method::GET,
            FetchMethod::Post => Method::POST,
            FetchMethod::Put => Method::PUT,
            FetchMethod::Delete => Method::DELETE,
        }
    }

    pub fn method_filter(&self) -> MethodFilter {
        match self {
            FetchMethod::Get => MethodFilter::GET,
            FetchMethod::Post => MethodFilter::POST,
            FetchMethod::Put => MethodFilter::PUT,
            FetchMethod::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(FetchMethod::Get),
            "POST" => Ok(FetchMethod::Post),
            "PUT" => Ok(FetchMethod::Put),
            "DELETE" => Ok(FetchMethod::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<&Method> for FetchMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}
