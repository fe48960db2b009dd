//! # Middleware Module
//!
//! Hooks that run around the backend call for every matched route.
//!
//! - [`CorsMiddleware`] enforces the route's bound CORS policy
//! - [`TracingMiddleware`] logs one structured event per request
//!
//! Custom middleware implements [`Middleware`] and is registered with
//! [`Gateway::add_middleware`](crate::gateway::Gateway::add_middleware).

mod core;
mod cors;
mod tracing;

pub use core::Middleware;
pub use cors::{
    evaluate, CorsDecision, CorsHeaders, CorsMiddleware, ALLOW_HEADERS, ALLOW_METHODS,
    ALLOW_ORIGIN,
};
pub use tracing::TracingMiddleware;
