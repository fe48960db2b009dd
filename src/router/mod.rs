//! # Router Module
//!
//! Host and path matching over the bound routes of a published
//! [`RouteTable`] generation.
//!
//! ## Matching
//!
//! - **Host**: exact (case-insensitive, port ignored), a leading wildcard
//!   label (`*.example.com` matches `api.example.com` but not
//!   `a.b.example.com`), or no host at all (matches every request).
//! - **Path**: `Exact` requires string equality; `Prefix` and
//!   `ImplementationSpecific` match on `/`-separated element boundaries.
//!
//! The most specific match wins: host rank first, then exact paths, then
//! the longest path.
//!
//! ## Example
//!
//! ```rust,ignore
//! let table = sync.table().load();
//! if let Some(m) = table.route("httpbin.org", "/ip") {
//!     println!("route {} -> {}", m.route.id, m.route.backend);
//! }
//! ```

mod core;

pub use core::{RouteMatch, RouteTable};
