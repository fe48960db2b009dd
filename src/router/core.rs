//! Router core module - hot path for request routing.
//!
//! A [`RouteTable`] is immutable once built. Reconciliation never mutates a
//! published table; it builds the next generation and swaps it in whole.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::ingress::PathMatchKind;
use crate::store::BoundRoute;

/// Result of successfully matching a request to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<BoundRoute>,
    /// Generation of the table the match was made against
    pub generation: u64,
}

/// How a rule host matched the request host; higher ranks win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HostRank {
    Any,
    Wildcard,
    Exact,
}

/// Immutable, generation-stamped set of bound routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    generation: u64,
    routes: Vec<Arc<BoundRoute>>,
}

impl RouteTable {
    /// Build a table from bound routes
    ///
    /// Route order is preserved for tie-breaking: among equally specific
    /// matches, the route listed first wins.
    #[must_use]
    pub fn new(generation: u64, routes: Vec<BoundRoute>) -> Self {
        let routes: Vec<Arc<BoundRoute>> = routes.into_iter().map(Arc::new).collect();

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{}{} -> {}", r.host.as_deref().unwrap_or("*"), r.path, r.backend))
            .collect();

        info!(
            generation,
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Route table built"
        );

        Self { generation, routes }
    }

    /// An empty generation-zero table
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<BoundRoute>> {
        self.routes.iter()
    }

    /// Match a request host and path to the most specific route
    ///
    /// Precedence: exact host over wildcard host over any-host; then an
    /// `Exact` path over a prefix path; then the longest path.
    ///
    /// # Arguments
    ///
    /// * `host` - `Host` header value; a port suffix is ignored
    /// * `path` - request path; a query string suffix is ignored
    #[must_use]
    pub fn route(&self, host: &str, path: &str) -> Option<RouteMatch> {
        let match_start = Instant::now();
        let host = strip_port(host);
        let path = path.split_once('?').map_or(path, |(p, _)| p);

        let mut best: Option<(HostRank, bool, usize, &Arc<BoundRoute>)> = None;
        for route in &self.routes {
            let Some(rank) = host_rank(route.host.as_deref(), host) else {
                continue;
            };
            if !path_matches(route.path_match_kind, &route.path, path) {
                continue;
            }
            let exact = route.path_match_kind == PathMatchKind::Exact;
            let candidate = (rank, exact, route.path.len());
            let better = match &best {
                Some((r, e, l, _)) => candidate > (*r, *e, *l),
                None => true,
            };
            if better {
                best = Some((rank, exact, route.path.len(), route));
            }
        }

        let match_duration = match_start.elapsed();
        if match_duration > Duration::from_millis(1) {
            warn!(
                host = %host,
                path = %path,
                duration_us = match_duration.as_micros(),
                routes_count = self.routes.len(),
                "Slow route matching detected"
            );
        }

        match best {
            Some((_, _, _, route)) => {
                debug!(
                    host = %host,
                    path = %path,
                    route_id = %route.id,
                    generation = self.generation,
                    "Route matched"
                );
                Some(RouteMatch {
                    route: Arc::clone(route),
                    generation: self.generation,
                })
            }
            None => {
                debug!(host = %host, path = %path, generation = self.generation, "No route matched");
                None
            }
        }
    }
}

/// Drop a `:port` suffix, keeping bracketed IPv6 literals intact
pub(crate) fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

fn host_rank(rule_host: Option<&str>, request_host: &str) -> Option<HostRank> {
    let Some(rule_host) = rule_host else {
        return Some(HostRank::Any);
    };
    if rule_host.eq_ignore_ascii_case(request_host) {
        return Some(HostRank::Exact);
    }
    // `*.example.com` covers exactly one extra leading label
    if let Some(suffix) = rule_host.strip_prefix("*.") {
        if let Some((label, rest)) = request_host.split_once('.') {
            if !label.is_empty() && rest.eq_ignore_ascii_case(suffix) {
                return Some(HostRank::Wildcard);
            }
        }
    }
    None
}

/// Element-wise prefix test: `/foo` matches `/foo` and `/foo/bar`, not `/foobar`
pub(crate) fn prefix_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn path_matches(kind: PathMatchKind, rule_path: &str, path: &str) -> bool {
    match kind {
        PathMatchKind::Exact => rule_path == path,
        PathMatchKind::Prefix | PathMatchKind::ImplementationSpecific => {
            prefix_matches(rule_path, path)
        }
    }
}
