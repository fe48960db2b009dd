use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Namespace used when a manifest omits `metadata.namespace`
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identity of one Ingress resource (`namespace/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IngressKey {
    pub namespace: String,
    pub name: String,
}

impl IngressKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for IngressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// How a rule path is compared against the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathMatchKind {
    Exact,
    Prefix,
    #[default]
    ImplementationSpecific,
}

impl fmt::Display for PathMatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatchKind::Exact => write!(f, "Exact"),
            PathMatchKind::Prefix => write!(f, "Prefix"),
            PathMatchKind::ImplementationSpecific => write!(f, "ImplementationSpecific"),
        }
    }
}

/// Service port reference, by number or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum BackendPort {
    Number(u16),
    Name(String),
}

impl fmt::Display for BackendPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPort::Number(n) => write!(f, "{}", n),
            BackendPort::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Resolved backend service reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackendRef {
    pub service_name: String,
    pub port: BackendPort,
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_name, self.port)
    }
}

/// One host/path rule of an [`IngressIntent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentRule {
    /// `None` matches any host
    pub host: Option<String>,
    pub path: String,
    pub path_match_kind: PathMatchKind,
    pub backend: BackendRef,
}

/// Schema-independent view of one Ingress resource
///
/// Every downstream component consumes this type only; the schema the
/// resource was declared in is fully absorbed by normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressIntent {
    pub key: IngressKey,
    /// Raw annotations, exactly as declared
    pub annotations: BTreeMap<String, String>,
    /// `spec.ingressClassName`, if set
    pub ingress_class: Option<String>,
    pub rules: Vec<IntentRule>,
    pub default_backend: Option<BackendRef>,
}

impl IngressIntent {
    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }
}

// ---------------------------------------------------------------------------
// Raw schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "annotation_values")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// Annotation values are strings; unquoted YAML scalars such as
/// `enable-cors: true` are kept as their text and null values are dropped.
fn annotation_values<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<BTreeMap<String, Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut annotations = BTreeMap::new();
    for (key, value) in raw {
        let text = match value {
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(D::Error::custom(format!(
                    "annotation '{key}' must be a string"
                )))
            }
        };
        annotations.insert(key, text);
    }
    Ok(Some(annotations))
}

impl ObjectMeta {
    pub fn key(&self) -> IngressKey {
        let namespace = self
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE);
        IngressKey::new(namespace, self.name.as_str())
    }
}

/// `IntOrString` as used by legacy `servicePort`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

/// Schema A: `networking.k8s.io/v1`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressV1 {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IngressSpecV1,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpecV1 {
    #[serde(default)]
    pub ingress_class_name: Option<String>,
    #[serde(default)]
    pub default_backend: Option<IngressBackendV1>,
    #[serde(default)]
    pub rules: Vec<IngressRuleV1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressRuleV1 {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub http: Option<HttpRuleValueV1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpRuleValueV1 {
    #[serde(default)]
    pub paths: Vec<HttpPathV1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPathV1 {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub path_type: Option<PathMatchKind>,
    pub backend: IngressBackendV1,
}

/// Nested backend: `service: {name, port: {number | name}}` or a typed `resource`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressBackendV1 {
    #[serde(default)]
    pub service: Option<ServiceBackendV1>,
    #[serde(default)]
    pub resource: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceBackendV1 {
    pub name: String,
    #[serde(default)]
    pub port: ServiceBackendPortV1,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceBackendPortV1 {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Schemas B and C: `networking.k8s.io/v1beta1` and `extensions/v1beta1`
///
/// Both share one body shape; they differ only in API group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressV1Beta1 {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IngressSpecV1Beta1,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpecV1Beta1 {
    #[serde(default)]
    pub ingress_class_name: Option<String>,
    #[serde(default)]
    pub backend: Option<IngressBackendV1Beta1>,
    #[serde(default)]
    pub rules: Vec<IngressRuleV1Beta1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressRuleV1Beta1 {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub http: Option<HttpRuleValueV1Beta1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpRuleValueV1Beta1 {
    #[serde(default)]
    pub paths: Vec<HttpPathV1Beta1>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPathV1Beta1 {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub path_type: Option<PathMatchKind>,
    pub backend: IngressBackendV1Beta1,
}

/// Flat backend: `serviceName` / `servicePort`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackendV1Beta1 {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_port: Option<IntOrString>,
    #[serde(default)]
    pub resource: Option<Value>,
}
