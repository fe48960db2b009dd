//! # CLI Module
//!
//! Command-line entry points of the `corsgate` binary.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Normalize and parse every resource in a manifest and print the bound
//! routes with their CORS policy as JSON. Exits non-zero if any document
//! could not be decoded:
//!
//! ```bash
//! corsgate check --manifests ingresses.yaml
//! ```
//!
//! ### `evaluate`
//!
//! Bind a manifest, run one request through the gateway and print the CORS
//! headers it received:
//!
//! ```bash
//! corsgate evaluate --manifests ingresses.yaml \
//!     --host httpbin.org --path /ip --origin https://foo.com
//! ```
//!
//! ### `watch`
//!
//! Reconcile a manifest, then keep reconciling it whenever the file changes:
//!
//! ```bash
//! corsgate --config corsgate.yaml watch --manifests ingresses.yaml
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
