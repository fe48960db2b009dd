use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Maximum number of headers stored inline before spilling to the heap
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for gateway requests and responses
///
/// Names keep the case they were set with; lookups ignore case.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// An end-user request as seen by the gateway
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// `Host` header value, possibly with a port
    pub host: String,
    /// Request target, possibly with a query string
    pub path: String,
    pub headers: HeaderVec,
}

impl GatewayRequest {
    /// Build a request; the request id comes from `x-request-id` when well formed
    #[must_use]
    pub fn new(method: Method, host: &str, path: &str, headers: HeaderVec) -> Self {
        let request_id = RequestId::from_header_or_new(find_header(&headers, REQUEST_ID_HEADER));
        Self {
            request_id,
            method,
            host: host.to_string(),
            path: path.to_string(),
            headers,
        }
    }

    /// Shorthand for a header-less `GET`
    #[must_use]
    pub fn get(host: &str, path: &str) -> Self {
        Self::new(Method::GET, host, path, HeaderVec::new())
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Get a header value by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response returned through the middleware chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Vec::new())
    }

    #[must_use]
    pub fn not_found() -> Self {
        let mut res = Self::new(404, HeaderVec::new(), b"404 route not found".to_vec());
        res.set_header("content-type", "text/plain".to_string());
        res
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Headers whose names start with `prefix` (case-insensitive), in insertion order
    pub fn headers_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.headers.iter().filter_map(move |(k, v)| {
            let matches = k.len() >= prefix.len()
                && k.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes());
            matches.then_some((k.as_ref(), v.as_str()))
        })
    }
}
