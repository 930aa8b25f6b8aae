//! Outbound request description.

use std::collections::BTreeMap;

use super::event::InboundEvent;
use super::method::FetchMethod;
use crate::error::ProxyResult;

/// Everything the fetcher needs to make one backend call.
///
/// Built once per inbound request, threaded through the extender chain and
/// consumed by the fetcher. Extenders return a complete description; headers
/// only ever gain or overwrite keys.
#[derive(Debug, Clone)]
pub struct RequestDescription<B> {
    pub url: String,
    pub method: FetchMethod,
    pub body: Option<B>,
    pub headers: BTreeMap<String, String>,
    pub event: InboundEvent,
}

impl<B> RequestDescription<B> {
    /// Initial description with a JSON content type.
    pub fn new(
        url: impl Into<String>,
        method: FetchMethod,
        body: Option<B>,
        event: InboundEvent,
    ) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            url: url.into(),
            method,
            body,
            headers,
            event,
        }
    }

    /// Add or overwrite a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Convert the body, keeping every other field.
    pub fn try_map_body<C>(
        self,
        f: impl FnOnce(Option<B>) -> ProxyResult<Option<C>>,
    ) -> ProxyResult<RequestDescription<C>> {
        Ok(RequestDescription {
            url: self.url,
            method: self.method,
            body: f(self.body)?,
            headers: self.headers,
            event: self.event,
        })
    }
}
