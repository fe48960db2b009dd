use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::gateway::{GatewayRequest, GatewayResponse};
use crate::store::BoundRoute;

/// Logs one structured event per request with its route and outcome
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &GatewayRequest, route: &BoundRoute) -> Option<GatewayResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            host = %req.host,
            path = %req.path,
            route_id = %route.id,
            "request received"
        );
        None
    }

    fn after(
        &self,
        req: &GatewayRequest,
        route: &BoundRoute,
        res: &mut GatewayResponse,
        latency: Duration,
    ) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            host = %req.host,
            path = %req.path,
            route_id = %route.id,
            backend = %route.backend,
            status = res.status,
            latency_us = latency_micros(latency),
            "request completed"
        );
    }
}

/// Saturating microsecond count for log fields
fn latency_micros(latency: Duration) -> u64 {
    u64::try_from(latency.as_micros()).unwrap_or(u64::MAX)
}
