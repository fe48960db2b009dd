use std::time::Duration;

use crate::gateway::{GatewayRequest, GatewayResponse};
use crate::store::BoundRoute;

/// Hook into the gateway pipeline around the backend call
///
/// `before` runs in registration order and may short-circuit with a
/// response. `after` runs in reverse registration order on every response,
/// including short-circuited ones.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &GatewayRequest, _route: &BoundRoute) -> Option<GatewayResponse> {
        None
    }
    fn after(
        &self,
        _req: &GatewayRequest,
        _route: &BoundRoute,
        _res: &mut GatewayResponse,
        _latency: Duration,
    ) {
    }
}
