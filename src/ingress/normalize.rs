use serde_json::Value;
use tracing::warn;

use super::error::IngressError;
use super::types::*;

/// Recognised Ingress schema kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// `networking.k8s.io/v1`, nested service backend
    NetworkingV1,
    /// `networking.k8s.io/v1beta1`, flat service backend
    NetworkingV1Beta1,
    /// `extensions/v1beta1`, flat service backend
    ExtensionsV1Beta1,
}

impl SchemaKind {
    pub const KIND: &'static str = "Ingress";

    pub fn api_version(&self) -> &'static str {
        match self {
            SchemaKind::NetworkingV1 => "networking.k8s.io/v1",
            SchemaKind::NetworkingV1Beta1 => "networking.k8s.io/v1beta1",
            SchemaKind::ExtensionsV1Beta1 => "extensions/v1beta1",
        }
    }

    /// Resolve an `apiVersion`/`kind` pair
    pub fn resolve(api_version: &str, kind: &str) -> Option<Self> {
        if kind != Self::KIND {
            return None;
        }
        match api_version {
            "networking.k8s.io/v1" => Some(SchemaKind::NetworkingV1),
            "networking.k8s.io/v1beta1" => Some(SchemaKind::NetworkingV1Beta1),
            "extensions/v1beta1" => Some(SchemaKind::ExtensionsV1Beta1),
            _ => None,
        }
    }
}

/// An Ingress resource in one of the supported schemas
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedIngress {
    NetworkingV1(IngressV1),
    NetworkingV1Beta1(IngressV1Beta1),
    ExtensionsV1Beta1(IngressV1Beta1),
}

impl VersionedIngress {
    /// Decode a raw object, dispatching on `apiVersion` and `kind`
    ///
    /// # Errors
    ///
    /// - [`IngressError::UnsupportedSchemaKind`] if the pair is not recognised
    /// - [`IngressError::Decode`] if the body does not match the schema
    pub fn from_value(value: Value) -> Result<Self, IngressError> {
        let api_version = value
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let schema = match SchemaKind::resolve(&api_version, &kind) {
            Some(schema) => schema,
            None => return Err(IngressError::UnsupportedSchemaKind { api_version, kind }),
        };

        let decode_err = |e: serde_json::Error| IngressError::Decode {
            api_version: schema.api_version().to_string(),
            message: e.to_string(),
        };

        Ok(match schema {
            SchemaKind::NetworkingV1 => {
                VersionedIngress::NetworkingV1(serde_json::from_value(value).map_err(decode_err)?)
            }
            SchemaKind::NetworkingV1Beta1 => VersionedIngress::NetworkingV1Beta1(
                serde_json::from_value(value).map_err(decode_err)?,
            ),
            SchemaKind::ExtensionsV1Beta1 => VersionedIngress::ExtensionsV1Beta1(
                serde_json::from_value(value).map_err(decode_err)?,
            ),
        })
    }

    pub fn schema(&self) -> SchemaKind {
        match self {
            VersionedIngress::NetworkingV1(_) => SchemaKind::NetworkingV1,
            VersionedIngress::NetworkingV1Beta1(_) => SchemaKind::NetworkingV1Beta1,
            VersionedIngress::ExtensionsV1Beta1(_) => SchemaKind::ExtensionsV1Beta1,
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        match self {
            VersionedIngress::NetworkingV1(ing) => &ing.metadata,
            VersionedIngress::NetworkingV1Beta1(ing) | VersionedIngress::ExtensionsV1Beta1(ing) => {
                &ing.metadata
            }
        }
    }

    pub fn key(&self) -> IngressKey {
        self.metadata().key()
    }

    /// Produce the schema-independent [`IngressIntent`]
    ///
    /// Paths whose backend cannot be resolved to a service name and port are
    /// dropped with a warning.
    pub fn normalize(&self) -> IngressIntent {
        match self {
            VersionedIngress::NetworkingV1(ing) => normalize_v1(ing),
            VersionedIngress::NetworkingV1Beta1(ing) | VersionedIngress::ExtensionsV1Beta1(ing) => {
                normalize_v1beta1(ing)
            }
        }
    }
}

/// Decode and normalize a raw object in one step
///
/// # Errors
///
/// See [`VersionedIngress::from_value`].
pub fn normalize_value(value: Value) -> Result<IngressIntent, IngressError> {
    VersionedIngress::from_value(value).map(|ing| ing.normalize())
}

fn rule_path(path: Option<&str>) -> String {
    match path {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "/".to_string(),
    }
}

fn rule_host(host: Option<&str>) -> Option<String> {
    host.filter(|h| !h.is_empty()).map(str::to_string)
}

fn port_from_number(number: i64) -> Option<BackendPort> {
    u16::try_from(number)
        .ok()
        .filter(|n| *n != 0)
        .map(BackendPort::Number)
}

fn backend_v1(backend: &IngressBackendV1) -> Option<BackendRef> {
    let service = backend.service.as_ref()?;
    let port = match (&service.port.number, &service.port.name) {
        (Some(number), _) => port_from_number(*number)?,
        (None, Some(name)) if !name.is_empty() => BackendPort::Name(name.clone()),
        _ => return None,
    };
    Some(BackendRef {
        service_name: service.name.clone(),
        port,
    })
}

fn backend_v1beta1(backend: &IngressBackendV1Beta1) -> Option<BackendRef> {
    let service_name = backend.service_name.as_ref().filter(|s| !s.is_empty())?;
    let port = match backend.service_port.as_ref()? {
        IntOrString::Int(number) => port_from_number(*number)?,
        IntOrString::String(s) => match s.parse::<i64>() {
            Ok(number) => port_from_number(number)?,
            Err(_) if !s.is_empty() => BackendPort::Name(s.clone()),
            Err(_) => return None,
        },
    };
    Some(BackendRef {
        service_name: service_name.clone(),
        port,
    })
}

fn normalize_v1(ing: &IngressV1) -> IngressIntent {
    let key = ing.metadata.key();
    let mut rules = Vec::new();

    for rule in &ing.spec.rules {
        let Some(http) = &rule.http else { continue };
        for p in &http.paths {
            match backend_v1(&p.backend) {
                Some(backend) => rules.push(IntentRule {
                    host: rule_host(rule.host.as_deref()),
                    path: rule_path(p.path.as_deref()),
                    path_match_kind: p.path_type.unwrap_or_default(),
                    backend,
                }),
                None => warn!(
                    ingress = %key,
                    path = ?p.path,
                    "skipping path without a resolvable service backend"
                ),
            }
        }
    }

    IngressIntent {
        annotations: ing.metadata.annotations.clone().unwrap_or_default(),
        ingress_class: ing.spec.ingress_class_name.clone(),
        default_backend: ing.spec.default_backend.as_ref().and_then(backend_v1),
        rules,
        key,
    }
}

fn normalize_v1beta1(ing: &IngressV1Beta1) -> IngressIntent {
    let key = ing.metadata.key();
    let mut rules = Vec::new();

    for rule in &ing.spec.rules {
        let Some(http) = &rule.http else { continue };
        for p in &http.paths {
            match backend_v1beta1(&p.backend) {
                Some(backend) => rules.push(IntentRule {
                    host: rule_host(rule.host.as_deref()),
                    path: rule_path(p.path.as_deref()),
                    path_match_kind: p.path_type.unwrap_or_default(),
                    backend,
                }),
                None => warn!(
                    ingress = %key,
                    path = ?p.path,
                    "skipping path without a resolvable service backend"
                ),
            }
        }
    }

    IngressIntent {
        annotations: ing.metadata.annotations.clone().unwrap_or_default(),
        ingress_class: ing.spec.ingress_class_name.clone(),
        default_backend: ing.spec.backend.as_ref().and_then(backend_v1beta1),
        rules,
        key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_schema_kinds() {
        assert_eq!(
            SchemaKind::resolve("networking.k8s.io/v1", "Ingress"),
            Some(SchemaKind::NetworkingV1)
        );
        assert_eq!(
            SchemaKind::resolve("extensions/v1beta1", "Ingress"),
            Some(SchemaKind::ExtensionsV1Beta1)
        );
        assert_eq!(SchemaKind::resolve("networking.k8s.io/v1", "Service"), None);
        assert_eq!(SchemaKind::resolve("apps/v1", "Ingress"), None);
    }

    #[test]
    fn test_unsupported_schema_kind() {
        let err = VersionedIngress::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "svc" }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            IngressError::UnsupportedSchemaKind {
                api_version: "v1".into(),
                kind: "Service".into()
            }
        );
    }

    #[test]
    fn test_legacy_string_service_port() {
        let backend = IngressBackendV1Beta1 {
            service_name: Some("httpbin".into()),
            service_port: Some(IntOrString::String("8080".into())),
            resource: None,
        };
        assert_eq!(
            backend_v1beta1(&backend).unwrap().port,
            BackendPort::Number(8080)
        );

        let named = IngressBackendV1Beta1 {
            service_port: Some(IntOrString::String("http".into())),
            ..backend
        };
        assert_eq!(
            backend_v1beta1(&named).unwrap().port,
            BackendPort::Name("http".into())
        );
    }

    #[test]
    fn test_out_of_range_port_is_unresolvable() {
        let backend = IngressBackendV1Beta1 {
            service_name: Some("httpbin".into()),
            service_port: Some(IntOrString::Int(70000)),
            resource: None,
        };
        assert!(backend_v1beta1(&backend).is_none());
    }

    #[test]
    fn test_v1_resource_backend_is_skipped() {
        let ing = VersionedIngress::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": { "name": "static" },
            "spec": { "rules": [{ "http": { "paths": [{
                "path": "/assets",
                "pathType": "Prefix",
                "backend": { "resource": { "apiGroup": "k8s.example.com", "kind": "StorageBucket", "name": "assets" } }
            }]}}]}
        }))
        .unwrap();
        let intent = ing.normalize();
        assert!(intent.rules.is_empty());
        assert_eq!(intent.namespace(), DEFAULT_NAMESPACE);
    }
}
