//! # corsgate
//!
//! **corsgate** translates CORS intent declared as annotations on Kubernetes
//! Ingress resources into a CORS policy enforced by the gateway on every
//! request to the routes those resources define.
//!
//! ## Overview
//!
//! Operators annotate an Ingress:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     k8s.apisix.apache.org/enable-cors: "true"
//!     k8s.apisix.apache.org/cors-allow-origin: "https://foo.com,https://bar.com"
//!     k8s.apisix.apache.org/cors-allow-methods: "GET,POST,PUT"
//!     k8s.apisix.apache.org/cors-allow-headers: "x-foo-1,x-foo-2"
//! ```
//!
//! and a request to one of its routes carrying `Origin: https://foo.com`
//! gets `Access-Control-Allow-Origin: https://foo.com` plus the configured
//! methods and headers. Any other origin, a missing `Origin` or a disabled
//! policy gets no CORS headers at all.
//!
//! ## Architecture
//!
//! - **[`ingress`]** - decodes the three supported Ingress schemas into one [`IngressIntent`]
//! - **[`annotations`]** - parses the CORS annotations into a [`CorsPolicy`]
//! - **[`controller`]** - class selection and per-resource reconciliation
//! - **[`store`]** - per-resource bindings and the config sync that publishes them
//! - **[`router`]** - host/path matching over a published route table
//! - **[`gateway`]** - the request pipeline: match, backend call, middleware
//! - **[`middleware`]** - CORS enforcement and request tracing
//! - **[`hot_reload`]** - reconciles a manifest file whenever it changes
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - the ambient runtime
//!
//! ### Data Flow
//!
//! ```text
//! raw Ingress ─► ingress::VersionedIngress ─► IngressIntent
//!                                               │
//!                         annotations::parse_cors_policy
//!                                               ▼
//!                      controller ─► ConfigStore::bind ─► (dirty)
//!                                                           │
//!                                   ConfigSync publishes RouteTable generation
//!                                                           ▼
//! request ─► Gateway::handle ─► RouteTable::route ─► backend ─► CorsMiddleware
//! ```
//!
//! The first three stages run only when configuration changes. Enforcement
//! runs per request against an immutable table snapshot and never locks.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use corsgate::{Controller, ControllerConfig, ConfigStore, ConfigSync, Gateway};
//! use corsgate::gateway::{GatewayRequest, GatewayResponse};
//! use corsgate::ingress::{load_manifests_str, BackendRef};
//!
//! let manifest = r#"
//! apiVersion: extensions/v1beta1
//! kind: Ingress
//! metadata:
//!   name: httpbin
//!   annotations:
//!     kubernetes.io/ingress.class: apisix
//!     k8s.apisix.apache.org/enable-cors: "true"
//!     k8s.apisix.apache.org/cors-allow-origin: "https://foo.com"
//! spec:
//!   rules:
//!     - host: httpbin.org
//!       http:
//!         paths:
//!           - path: /ip
//!             backend:
//!               serviceName: httpbin
//!               servicePort: 80
//! "#;
//!
//! let store = Arc::new(ConfigStore::new());
//! let controller = Controller::new(Arc::new(ControllerConfig::default()), Arc::clone(&store));
//! controller.sync_all(load_manifests_str(manifest));
//!
//! let sync = ConfigSync::new(store);
//! sync.flush();
//!
//! let gateway = Gateway::new(
//!     sync.table(),
//!     Arc::new(|_: &BackendRef, _: &GatewayRequest| GatewayResponse::empty(200)),
//! );
//! let res = gateway.handle(
//!     &GatewayRequest::get("httpbin.org", "/ip").with_header("Origin", "https://foo.com"),
//! );
//! assert_eq!(res.get_header("Access-Control-Allow-Origin"), Some("https://foo.com"));
//! ```

pub mod annotations;
pub mod cli;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod hot_reload;
pub mod ids;
pub mod ingress;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod store;

pub use annotations::{parse_cors_policy, AnnotationReader, CorsPolicy};
pub use config::ControllerConfig;
pub use controller::{Controller, ReconcileOutcome, SyncReport};
pub use gateway::{Backend, Gateway};
pub use ingress::{IngressError, IngressIntent, VersionedIngress};
pub use store::{BindOutcome, ConfigStore, ConfigSync};
