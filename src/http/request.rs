//! Inbound request view
//!
//! A body-less snapshot of the request line and headers, detached from the
//! connection so dispatch can run on a blocking worker.

use hyper::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use hyper::Method;

/// Request as seen by the router and handlers
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    host: String,
    headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            host: host.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a header (test and adapter helper)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Build from the head of a hyper request
    ///
    /// Host comes from the `Host` header, falling back to the URI authority.
    pub fn from_parts(parts: &hyper::http::request::Parts) -> Self {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();

        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

        Self {
            method: parts.method.clone(),
            uri,
            host,
            headers: parts.headers.clone(),
        }
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Full request URI including the query string
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request path with the query string removed
    pub fn path(&self) -> &str {
        strip_query(&self.uri)
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, q)| q)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, `None` if absent or not visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

/// Cut a URI at the first `?`
pub fn strip_query(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}
