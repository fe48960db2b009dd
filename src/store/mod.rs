//! # Store Module
//!
//! The controller's in-memory configuration store and the sync loop that
//! publishes it to the gateway.
//!
//! ## Binding
//!
//! [`ConfigStore::bind`] replaces the whole [`ResourceBinding`] of a
//! resource in one step: a concurrent reconciliation of the same resource
//! either lands entirely before or entirely after, never interleaved field
//! by field. Last write wins. Different resources live in different map
//! entries and reconcile in parallel.
//!
//! ## Publication
//!
//! Binding only marks the store dirty. [`ConfigSync`] notices on its next
//! tick, builds a fresh [`RouteTable`](crate::router::RouteTable) generation
//! from a snapshot of the store and swaps it into the shared
//! [`RouteTableHandle`]. The request path reads that handle without locks.
//!
//! ```text
//! Controller --bind--> ConfigStore --(dirty)--> ConfigSync --swap--> RouteTableHandle --load--> Gateway
//! ```

mod route;
mod sync;

pub use route::{BoundRoute, ResourceBinding};
pub use sync::{ConfigSync, RouteTableHandle};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::annotations::CorsPolicy;
use crate::ingress::{IngressIntent, IngressKey};

/// Effect of a [`ConfigStore::bind`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// First binding for the resource
    Created,
    /// Binding replaced with different content
    Updated,
    /// Identical to the current binding; nothing to publish
    Unchanged,
}

/// Controller-owned store of resource bindings
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: DashMap<IngressKey, ResourceBinding>,
    dirty: AtomicBool,
}

impl ConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a policy to every rule of the intent, replacing any previous binding
    ///
    /// Marks the store dirty unless the result is [`BindOutcome::Unchanged`].
    pub fn bind(&self, intent: &IngressIntent, policy: CorsPolicy) -> BindOutcome {
        let binding = ResourceBinding::from_intent(intent, policy);
        let routes_count = binding.routes.len();

        let outcome = match self.entries.entry(intent.key.clone()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == binding {
                    BindOutcome::Unchanged
                } else {
                    entry.insert(binding);
                    BindOutcome::Updated
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(binding);
                BindOutcome::Created
            }
        };

        match outcome {
            BindOutcome::Unchanged => {
                debug!(ingress = %intent.key, "binding unchanged");
            }
            _ => {
                info!(
                    ingress = %intent.key,
                    outcome = ?outcome,
                    routes_count,
                    "resource bound"
                );
                self.mark_dirty();
            }
        }
        outcome
    }

    /// Remove every route of a resource
    ///
    /// Returns `true` if the resource was bound.
    pub fn unbind(&self, key: &IngressKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            info!(ingress = %key, "resource unbound");
            self.mark_dirty();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, key: &IngressKey) -> Option<ResourceBinding> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn policy(&self, key: &IngressKey) -> Option<Arc<CorsPolicy>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.policy))
    }

    #[must_use]
    pub fn contains(&self, key: &IngressKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys of all bound resources, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<IngressKey> {
        let mut keys: Vec<IngressKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All bound routes, ordered by resource key then rule order
    #[must_use]
    pub fn snapshot(&self) -> Vec<BoundRoute> {
        let mut bindings: Vec<(IngressKey, Arc<[BoundRoute]>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(&e.value().routes)))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
            .iter()
            .flat_map(|(_, routes)| routes.iter().cloned())
            .collect()
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clear the dirty flag, returning whether it was set
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::{BackendPort, BackendRef, IntentRule, PathMatchKind};
    use std::collections::BTreeMap;

    fn intent(name: &str, paths: &[&str]) -> IngressIntent {
        IngressIntent {
            key: IngressKey::new("default", name),
            annotations: BTreeMap::new(),
            ingress_class: None,
            rules: paths
                .iter()
                .map(|p| IntentRule {
                    host: Some("httpbin.org".into()),
                    path: p.to_string(),
                    path_match_kind: PathMatchKind::Exact,
                    backend: BackendRef {
                        service_name: "httpbin".into(),
                        port: BackendPort::Number(80),
                    },
                })
                .collect(),
            default_backend: None,
        }
    }

    fn enabled(origins: &[&str]) -> CorsPolicy {
        CorsPolicy {
            enabled: true,
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            allowed_methods: "GET".into(),
            allowed_headers: String::new(),
        }
    }

    #[test]
    fn test_bind_lifecycle() {
        let store = ConfigStore::new();
        let ing = intent("a", &["/ip", "/get"]);

        assert_eq!(store.bind(&ing, enabled(&["https://foo.com"])), BindOutcome::Created);
        assert!(store.take_dirty());
        assert!(!store.take_dirty());

        assert_eq!(store.bind(&ing, enabled(&["https://foo.com"])), BindOutcome::Unchanged);
        assert!(!store.take_dirty());

        assert_eq!(store.bind(&ing, enabled(&["https://bar.com"])), BindOutcome::Updated);
        assert!(store.take_dirty());

        let binding = store.get(&ing.key).unwrap();
        assert_eq!(binding.routes.len(), 2);
        assert!(binding
            .routes
            .iter()
            .all(|r| r.cors.allowed_origins == vec!["https://bar.com".to_string()]));

        assert!(store.unbind(&ing.key));
        assert!(!store.unbind(&ing.key));
        assert!(store.take_dirty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_routes_share_resource_policy() {
        let store = ConfigStore::new();
        let ing = intent("a", &["/ip", "/get", "/headers"]);
        store.bind(&ing, enabled(&["https://foo.com"]));

        let binding = store.get(&ing.key).unwrap();
        for route in binding.routes.iter() {
            assert!(Arc::ptr_eq(&route.cors, &binding.policy));
        }
        assert_eq!(binding.routes[2].id, "default/a#2");
    }

    #[test]
    fn test_rebind_does_not_accumulate() {
        let store = ConfigStore::new();
        let ing = intent("a", &["/ip"]);
        for _ in 0..5 {
            store.bind(&ing, enabled(&["https://foo.com", "https://bar.com"]));
        }
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.policy(&ing.key).unwrap().allowed_origins.len(), 2);
    }

    #[test]
    fn test_snapshot_is_ordered_by_key() {
        let store = ConfigStore::new();
        store.bind(&intent("b", &["/b"]), CorsPolicy::disabled());
        store.bind(&intent("a", &["/a1", "/a2"]), CorsPolicy::disabled());
        let paths: Vec<String> = store.snapshot().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/a1", "/a2", "/b"]);
        assert_eq!(
            store.keys(),
            vec![IngressKey::new("default", "a"), IngressKey::new("default", "b")]
        );
    }
}
