use serde::Serialize;

use super::{
    AnnotationReader, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN, ENABLE_CORS,
};

/// CORS policy of one Ingress resource
///
/// Shared by every route the resource defines. When `enabled` is false the
/// remaining fields are kept for idempotent reconfiguration but are never
/// consulted by the enforcer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CorsPolicy {
    pub enabled: bool,
    /// Exact origins, declaration order, no duplicates
    pub allowed_origins: Vec<String>,
    /// Emitted verbatim as `Access-Control-Allow-Methods`
    pub allowed_methods: String,
    /// Emitted verbatim as `Access-Control-Allow-Headers`
    pub allowed_headers: String,
}

impl CorsPolicy {
    /// A policy that never emits headers
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Case-sensitive exact membership test; no wildcard or scheme folding
    #[inline]
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

fn split_origins(value: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in value.split(',') {
        if origin.is_empty() || origins.iter().any(|o| o == origin) {
            continue;
        }
        origins.push(origin.to_string());
    }
    origins
}

/// Parse the CORS annotation group
///
/// Only the literal `"true"` enables the policy: `"True"`, `"1"`, `""`,
/// `"false"` and a missing annotation all disable it. Origins are split on
/// `,` without trimming, so `"https://a.com, https://b.com"` allows
/// `" https://b.com"` and not `"https://b.com"`. Methods and headers are
/// carried through as written.
///
/// Never fails.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use corsgate::annotations::{parse_cors_policy, AnnotationReader, DEFAULT_ANNOTATION_PREFIX};
///
/// let mut annotations = BTreeMap::new();
/// annotations.insert("k8s.apisix.apache.org/enable-cors".into(), "true".into());
/// annotations.insert("k8s.apisix.apache.org/cors-allow-origin".into(), "https://foo.com,https://bar.com".into());
///
/// let policy = parse_cors_policy(&AnnotationReader::new(DEFAULT_ANNOTATION_PREFIX, &annotations));
/// assert!(policy.enabled);
/// assert!(policy.allows_origin("https://bar.com"));
/// assert!(!policy.allows_origin("https://BAR.com"));
/// ```
pub fn parse_cors_policy(reader: &AnnotationReader<'_>) -> CorsPolicy {
    CorsPolicy {
        enabled: reader.get(ENABLE_CORS) == Some("true"),
        allowed_origins: reader
            .get(CORS_ALLOW_ORIGIN)
            .map(split_origins)
            .unwrap_or_default(),
        allowed_methods: reader
            .get(CORS_ALLOW_METHODS)
            .unwrap_or_default()
            .to_string(),
        allowed_headers: reader
            .get(CORS_ALLOW_HEADERS)
            .unwrap_or_default()
            .to_string(),
    }
}
