//! # Ingress Module
//!
//! Schema normalization for Kubernetes Ingress resources.
//!
//! Three Ingress schemas are in circulation and differ chiefly in how a path
//! references its backend service:
//!
//! | Schema | Backend reference |
//! |---|---|
//! | `networking.k8s.io/v1` | `service: { name, port: { number \| name } }` |
//! | `networking.k8s.io/v1beta1` | `serviceName` / `servicePort` |
//! | `extensions/v1beta1` | `serviceName` / `servicePort` |
//!
//! Each schema is a variant of [`VersionedIngress`] with its own conversion
//! into the single canonical [`IngressIntent`]. Nothing downstream of this
//! module knows which schema a resource was declared in.
//!
//! ## Example
//!
//! ```rust
//! use corsgate::ingress::load_manifests_str;
//!
//! let docs = load_manifests_str(r#"
//! apiVersion: extensions/v1beta1
//! kind: Ingress
//! metadata:
//!   name: ingress-extensions-v1beta1
//! spec:
//!   rules:
//!   - host: httpbin.org
//!     http:
//!       paths:
//!       - path: /ip
//!         pathType: Exact
//!         backend:
//!           serviceName: httpbin
//!           servicePort: 80
//! "#);
//! let intent = docs[0].as_ref().unwrap().normalize();
//! assert_eq!(intent.rules[0].backend.service_name, "httpbin");
//! ```

mod error;
mod load;
mod normalize;
mod types;

pub use error::IngressError;
pub use load::{load_manifest_file, load_manifests_str, ManifestDocument};
pub use normalize::{normalize_value, SchemaKind, VersionedIngress};
pub use types::*;
