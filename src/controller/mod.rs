//! # Controller Module
//!
//! Reconciliation entry points: one call per resource event.
//!
//! [`Controller::apply`] runs ingress-class selection, normalization, CORS
//! annotation parsing and binding for a single resource. Nothing here waits
//! for the gateway; publication happens later through
//! [`ConfigSync`](crate::store::ConfigSync).
//!
//! ## Class Selection
//!
//! A resource is reconciled when, in order of precedence:
//!
//! 1. its `kubernetes.io/ingress.class` annotation equals the configured class,
//! 2. it has no such annotation and `spec.ingressClassName` equals the class,
//! 3. it declares neither and `watch_unclassified` is enabled.
//!
//! A resource that is bound and then re-applied with a different class is
//! unbound.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::annotations::{parse_cors_policy, AnnotationReader, INGRESS_CLASS_ANNOTATION};
use crate::config::ControllerConfig;
use crate::ingress::{IngressError, IngressIntent, IngressKey, ManifestDocument, VersionedIngress};
use crate::store::{BindOutcome, ConfigStore};

/// Result of reconciling one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Bound(BindOutcome),
    /// Not selected by this controller; any previous binding was removed
    Ignored { reason: String },
}

/// Summary of a full resync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Resources bound, whether or not their binding changed
    pub applied: Vec<IngressKey>,
    /// Resources skipped by class selection
    pub ignored: Vec<IngressKey>,
    /// Resources unbound because they disappeared from the set
    pub removed: Vec<IngressKey>,
    /// Documents that are not a recognised Ingress schema
    pub skipped: Vec<String>,
    /// Documents that could not be decoded
    pub failed: Vec<String>,
}

/// Turns Ingress resources into bound routes in the [`ConfigStore`]
#[derive(Debug, Clone)]
pub struct Controller {
    config: Arc<ControllerConfig>,
    store: Arc<ConfigStore>,
}

impl Controller {
    #[must_use]
    pub fn new(config: Arc<ControllerConfig>, store: Arc<ConfigStore>) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Reconcile one resource
    pub fn apply(&self, ingress: &VersionedIngress) -> ReconcileOutcome {
        let intent = ingress.normalize();
        if let Err(reason) = self.select(&intent) {
            if self.store.unbind(&intent.key) {
                info!(ingress = %intent.key, reason = %reason, "resource left ingress class");
            } else {
                debug!(ingress = %intent.key, reason = %reason, "resource ignored");
            }
            return ReconcileOutcome::Ignored { reason };
        }

        let reader = AnnotationReader::new(&self.config.annotation_prefix, &intent.annotations);
        let policy = parse_cors_policy(&reader);
        debug!(
            ingress = %intent.key,
            schema = ?ingress.schema(),
            cors_enabled = policy.enabled,
            origins_count = policy.allowed_origins.len(),
            "reconciling resource"
        );
        ReconcileOutcome::Bound(self.store.bind(&intent, policy))
    }

    /// Decode and reconcile a raw resource object
    ///
    /// # Errors
    ///
    /// Returns the decode error; the store is left untouched.
    pub fn apply_value(&self, value: Value) -> Result<ReconcileOutcome, IngressError> {
        let ingress = VersionedIngress::from_value(value).map_err(|e| {
            warn!(error = %e, "skipping resource");
            e
        })?;
        Ok(self.apply(&ingress))
    }

    /// Handle a resource deletion; returns whether anything was bound
    pub fn delete(&self, key: &IngressKey) -> bool {
        self.store.unbind(key)
    }

    /// Reconcile a complete resource set
    ///
    /// Every decoded document is applied and bound resources missing from
    /// the set are unbound. Documents of other kinds (a `Service` next to the
    /// Ingress) are skipped and never block removal. When a document fails to
    /// parse or decode, the removal step is skipped: it may be the only copy
    /// of a resource that is still meant to exist.
    pub fn sync_all(&self, documents: Vec<ManifestDocument>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut seen = BTreeSet::new();

        for document in documents {
            match document {
                Ok(ingress) => {
                    let key = ingress.key();
                    match self.apply(&ingress) {
                        ReconcileOutcome::Bound(_) => report.applied.push(key.clone()),
                        ReconcileOutcome::Ignored { .. } => report.ignored.push(key.clone()),
                    }
                    seen.insert(key);
                }
                Err(e @ IngressError::UnsupportedSchemaKind { .. }) => {
                    debug!(error = %e, "skipping non-ingress document");
                    report.skipped.push(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "skipping manifest document");
                    report.failed.push(e.to_string());
                }
            }
        }

        if report.failed.is_empty() {
            for key in self.store.keys() {
                if !seen.contains(&key) && self.store.unbind(&key) {
                    report.removed.push(key);
                }
            }
        } else {
            warn!(
                failed = report.failed.len(),
                "not removing absent resources while documents fail to decode"
            );
        }

        info!(
            applied = report.applied.len(),
            ignored = report.ignored.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "resource set reconciled"
        );
        report
    }

    fn select(&self, intent: &IngressIntent) -> Result<(), String> {
        let wanted = self.config.ingress_class.as_str();
        let reader = AnnotationReader::new(&self.config.annotation_prefix, &intent.annotations);
        if let Some(class) = reader.get_raw(INGRESS_CLASS_ANNOTATION) {
            return if class == wanted {
                Ok(())
            } else {
                Err(format!("ingress class annotation '{class}' is not '{wanted}'"))
            };
        }
        match intent.ingress_class.as_deref() {
            Some(class) if class == wanted => Ok(()),
            Some(class) => Err(format!("ingressClassName '{class}' is not '{wanted}'")),
            None if self.config.watch_unclassified => Ok(()),
            None => Err("no ingress class and unclassified resources are not watched".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::load_manifests_str;
    use serde_json::json;

    fn controller(watch_unclassified: bool) -> Controller {
        let config = ControllerConfig {
            watch_unclassified,
            ..ControllerConfig::default()
        };
        Controller::new(Arc::new(config), Arc::new(ConfigStore::new()))
    }

    fn ingress(name: &str, annotations: Value, class_name: Option<&str>) -> Value {
        let mut value = json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": name, "annotations": annotations},
            "spec": {
                "rules": [{
                    "host": "httpbin.org",
                    "http": {"paths": [{
                        "path": "/ip",
                        "pathType": "Exact",
                        "backend": {"service": {"name": "httpbin", "port": {"number": 80}}}
                    }]}
                }]
            }
        });
        if let Some(class) = class_name {
            value["spec"]["ingressClassName"] = json!(class);
        }
        value
    }

    #[test]
    fn test_class_selection() {
        let ctrl = controller(false);
        let annotated = ingress("a", json!({"kubernetes.io/ingress.class": "apisix"}), None);
        assert_eq!(
            ctrl.apply_value(annotated).unwrap(),
            ReconcileOutcome::Bound(BindOutcome::Created)
        );

        let by_spec = ingress("b", json!({}), Some("apisix"));
        assert!(matches!(ctrl.apply_value(by_spec).unwrap(), ReconcileOutcome::Bound(_)));

        // the annotation takes precedence over spec.ingressClassName
        let conflicting = ingress("c", json!({"kubernetes.io/ingress.class": "nginx"}), Some("apisix"));
        assert!(matches!(
            ctrl.apply_value(conflicting).unwrap(),
            ReconcileOutcome::Ignored { .. }
        ));

        let unclassified = ingress("d", json!({}), None);
        assert!(matches!(
            ctrl.apply_value(unclassified.clone()).unwrap(),
            ReconcileOutcome::Ignored { .. }
        ));
        assert!(matches!(
            controller(true).apply_value(unclassified).unwrap(),
            ReconcileOutcome::Bound(_)
        ));
    }

    #[test]
    fn test_leaving_class_unbinds() {
        let ctrl = controller(false);
        ctrl.apply_value(ingress("a", json!({}), Some("apisix"))).unwrap();
        assert!(ctrl.store().contains(&IngressKey::new("default", "a")));

        ctrl.apply_value(ingress("a", json!({}), Some("nginx"))).unwrap();
        assert!(!ctrl.store().contains(&IngressKey::new("default", "a")));
    }

    #[test]
    fn test_apply_parses_cors_with_configured_prefix() {
        let config = ControllerConfig {
            annotation_prefix: "example.io/".into(),
            watch_unclassified: true,
            ..ControllerConfig::default()
        };
        let ctrl = Controller::new(Arc::new(config), Arc::new(ConfigStore::new()));
        ctrl.apply_value(ingress(
            "a",
            json!({
                "example.io/enable-cors": "true",
                "example.io/cors-allow-origin": "https://foo.com",
                "k8s.apisix.apache.org/cors-allow-origin": "https://ignored.com"
            }),
            None,
        ))
        .unwrap();

        let policy = ctrl.store().policy(&IngressKey::new("default", "a")).unwrap();
        assert!(policy.enabled);
        assert_eq!(policy.allowed_origins, vec!["https://foo.com".to_string()]);
    }

    #[test]
    fn test_unsupported_schema_leaves_store_untouched() {
        let ctrl = controller(true);
        let err = ctrl
            .apply_value(json!({"apiVersion": "networking.k8s.io/v2", "kind": "Ingress"}))
            .unwrap_err();
        assert!(matches!(err, IngressError::UnsupportedSchemaKind { .. }));
        assert!(ctrl.store().is_empty());
    }

    #[test]
    fn test_sync_all_removes_absent_resources() {
        let ctrl = controller(true);
        let decode = |v: Value| VersionedIngress::from_value(v);

        let report = ctrl.sync_all(vec![
            decode(ingress("a", json!({}), None)),
            decode(ingress("b", json!({}), None)),
        ]);
        assert_eq!(report.applied.len(), 2);

        let report = ctrl.sync_all(vec![decode(ingress("a", json!({}), None))]);
        assert_eq!(report.removed, vec![IngressKey::new("default", "b")]);
        assert_eq!(ctrl.store().keys(), vec![IngressKey::new("default", "a")]);
    }

    #[test]
    fn test_sync_all_keeps_resources_when_a_document_fails() {
        let ctrl = controller(true);
        ctrl.sync_all(vec![VersionedIngress::from_value(ingress("a", json!({}), None))]);

        // right schema, body that does not decode
        let report = ctrl.sync_all(vec![VersionedIngress::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": "a"},
            "spec": {"rules": "not-a-list"}
        }))]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.removed.is_empty());
        assert!(ctrl.store().contains(&IngressKey::new("default", "a")));
    }

    #[test]
    fn test_sync_all_removes_despite_neighbouring_service() {
        let ctrl = controller(true);
        let manifest = r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: a
spec:
  rules:
  - host: httpbin.org
    http:
      paths:
      - path: /ip
        pathType: Exact
        backend:
          service:
            name: httpbin
            port:
              number: 80
---
apiVersion: v1
kind: Service
metadata:
  name: httpbin
"#;
        let report = ctrl.sync_all(load_manifests_str(manifest));
        assert_eq!(report.applied, vec![IngressKey::new("default", "a")]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failed.is_empty());

        // the Ingress is deleted; the Service stays in the manifest
        let report = ctrl.sync_all(load_manifests_str(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: httpbin\n",
        ));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.removed, vec![IngressKey::new("default", "a")]);
        assert!(!ctrl.store().contains(&IngressKey::new("default", "a")));
    }
}
