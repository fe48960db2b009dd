use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::{GatewayRequest, GatewayResponse};
use crate::ingress::BackendRef;
use crate::middleware::{CorsMiddleware, Middleware};
use crate::store::RouteTableHandle;

/// Upstream service call made for a matched route
pub trait Backend: Send + Sync {
    fn call(&self, backend: &BackendRef, req: &GatewayRequest) -> GatewayResponse;
}

impl<F> Backend for F
where
    F: Fn(&BackendRef, &GatewayRequest) -> GatewayResponse + Send + Sync,
{
    fn call(&self, backend: &BackendRef, req: &GatewayRequest) -> GatewayResponse {
        self(backend, req)
    }
}

/// Request pipeline of the data plane
///
/// Every request is served from one route-table snapshot loaded at the
/// start of [`handle`](Self::handle); a publish that lands mid-request is
/// only seen by later requests.
pub struct Gateway {
    table: RouteTableHandle,
    backend: Arc<dyn Backend>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Gateway {
    /// Create a gateway with CORS enforcement registered
    pub fn new(table: RouteTableHandle, backend: Arc<dyn Backend>) -> Self {
        Self {
            table,
            backend,
            middlewares: vec![Arc::new(CorsMiddleware::new())],
        }
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Route a request, call its backend and run the middleware chain
    ///
    /// Unmatched requests get a 404 without reaching any backend or middleware.
    pub fn handle(&self, req: &GatewayRequest) -> GatewayResponse {
        let started = Instant::now();
        let table = self.table.load();

        let Some(matched) = table.route(&req.host, &req.path) else {
            debug!(
                request_id = %req.request_id,
                host = %req.host,
                path = %req.path,
                generation = table.generation(),
                "no route for request"
            );
            return GatewayResponse::not_found();
        };
        let route = &matched.route;

        let mut ran = 0;
        let mut early = None;
        for middleware in &self.middlewares {
            ran += 1;
            if let Some(res) = middleware.before(req, route) {
                early = Some(res);
                break;
            }
        }

        let mut res = match early {
            Some(res) => res,
            None => self.backend.call(&route.backend, req),
        };

        let latency = started.elapsed();
        for middleware in self.middlewares[..ran].iter().rev() {
            middleware.after(req, route, &mut res, latency);
        }
        res
    }
}
