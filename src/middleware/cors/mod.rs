//! Gateway CORS enforcement.
//!
//! Per request, the policy bound to the matched route decides whether the
//! response carries CORS headers. Rejection is always silent: the response
//! is served as the backend produced it, with no CORS headers added and no
//! error status.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::annotations::CorsPolicy;
use crate::gateway::{GatewayRequest, GatewayResponse};
use crate::middleware::Middleware;
use crate::store::BoundRoute;

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ALLOW_METHODS: &str = "access-control-allow-methods";
pub const ALLOW_HEADERS: &str = "access-control-allow-headers";

/// The three headers emitted for an allowed origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorsHeaders<'a> {
    #[serde(rename = "Access-Control-Allow-Origin")]
    pub allow_origin: &'a str,
    #[serde(rename = "Access-Control-Allow-Methods")]
    pub allow_methods: &'a str,
    #[serde(rename = "Access-Control-Allow-Headers")]
    pub allow_headers: &'a str,
}

impl CorsHeaders<'_> {
    /// Write the headers, replacing any same-named header the backend set
    pub fn apply(&self, res: &mut GatewayResponse) {
        res.set_header(ALLOW_ORIGIN, self.allow_origin.to_owned());
        res.set_header(ALLOW_METHODS, self.allow_methods.to_owned());
        res.set_header(ALLOW_HEADERS, self.allow_headers.to_owned());
    }
}

/// Outcome of evaluating a policy against a request origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsDecision<'a> {
    Disabled,
    NoOrigin,
    OriginRejected,
    Allowed(CorsHeaders<'a>),
}

impl<'a> CorsDecision<'a> {
    #[must_use]
    pub fn headers(&self) -> Option<&CorsHeaders<'a>> {
        match self {
            CorsDecision::Allowed(headers) => Some(headers),
            _ => None,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            CorsDecision::Disabled => "cors disabled",
            CorsDecision::NoOrigin => "no origin header",
            CorsDecision::OriginRejected => "origin not allowed",
            CorsDecision::Allowed(_) => "origin allowed",
        }
    }
}

/// Decide which CORS headers a response gets
///
/// Headers are emitted only when the policy is enabled, an `Origin` is
/// present, and that origin is byte-for-byte one of the allowed origins.
/// The allowed origin is echoed back; methods and headers are passed
/// through exactly as configured.
///
/// ```
/// use corsgate::annotations::CorsPolicy;
/// use corsgate::middleware::evaluate;
///
/// let policy = CorsPolicy {
///     enabled: true,
///     allowed_origins: vec!["https://foo.com".into()],
///     allowed_methods: "GET,POST".into(),
///     allowed_headers: "x-foo".into(),
/// };
/// let decision = evaluate(&policy, Some("https://foo.com"));
/// assert_eq!(decision.headers().map(|h| h.allow_origin), Some("https://foo.com"));
/// assert!(evaluate(&policy, Some("https://FOO.com")).headers().is_none());
/// ```
#[must_use]
pub fn evaluate<'a>(policy: &'a CorsPolicy, origin: Option<&'a str>) -> CorsDecision<'a> {
    if !policy.enabled {
        return CorsDecision::Disabled;
    }
    let Some(origin) = origin else {
        return CorsDecision::NoOrigin;
    };
    if !policy.allows_origin(origin) {
        return CorsDecision::OriginRejected;
    }
    CorsDecision::Allowed(CorsHeaders {
        allow_origin: origin,
        allow_methods: &policy.allowed_methods,
        allow_headers: &policy.allowed_headers,
    })
}

/// Enforces the CORS policy bound to each matched route
#[derive(Debug, Default, Clone, Copy)]
pub struct CorsMiddleware;

impl CorsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for CorsMiddleware {
    fn after(
        &self,
        req: &GatewayRequest,
        route: &BoundRoute,
        res: &mut GatewayResponse,
        _latency: Duration,
    ) {
        let origin = req.get_header("origin");
        let decision = evaluate(&route.cors, origin);
        debug!(
            request_id = %req.request_id,
            route_id = %route.id,
            origin = origin.unwrap_or(""),
            decision = decision.reason(),
            "CORS decision"
        );
        if let CorsDecision::Allowed(headers) = decision {
            headers.apply(res);
        }
    }
}
