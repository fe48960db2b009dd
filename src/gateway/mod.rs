//! # Gateway Module
//!
//! A minimal data plane: it resolves each request against the published
//! route table, calls the route's [`Backend`] and runs the registered
//! [`Middleware`](crate::middleware::Middleware) chain around that call.
//! Sockets, TLS and proxying are left to the embedding server; a backend
//! is anything implementing [`Backend`], including a plain closure.
//!
//! ```
//! use std::sync::Arc;
//! use corsgate::gateway::{Gateway, GatewayRequest, GatewayResponse};
//! use corsgate::ingress::BackendRef;
//! use corsgate::store::{ConfigStore, ConfigSync};
//!
//! let sync = ConfigSync::new(Arc::new(ConfigStore::new()));
//! let gateway = Gateway::new(
//!     sync.table(),
//!     Arc::new(|_: &BackendRef, _: &GatewayRequest| GatewayResponse::empty(200)),
//! );
//! assert_eq!(gateway.handle(&GatewayRequest::get("httpbin.org", "/ip")).status, 404);
//! ```

mod core;
mod request;

pub use core::{Backend, Gateway};
pub use request::{GatewayRequest, GatewayResponse, HeaderVec, MAX_INLINE_HEADERS};
