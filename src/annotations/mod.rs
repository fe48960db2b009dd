//! # Annotations Module
//!
//! Annotation keys understood by the controller, and typed parsers for the
//! annotation groups it translates.
//!
//! Annotation values are untyped strings. Parsing here is permissive: a
//! missing or malformed value never fails ingestion, it degrades to the
//! group's safe default. See [`parse_cors_policy`] for the CORS group.

mod cors;

pub use cors::{parse_cors_policy, CorsPolicy};

use std::collections::BTreeMap;

/// Default prefix of every controller annotation
pub const DEFAULT_ANNOTATION_PREFIX: &str = "k8s.apisix.apache.org/";

/// Legacy class selector annotation
pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// `"true"` enables CORS on the resource
pub const ENABLE_CORS: &str = "enable-cors";
/// Comma-separated allow-list of exact origins
pub const CORS_ALLOW_ORIGIN: &str = "cors-allow-origin";
/// Value for `Access-Control-Allow-Headers`, verbatim
pub const CORS_ALLOW_HEADERS: &str = "cors-allow-headers";
/// Value for `Access-Control-Allow-Methods`, verbatim
pub const CORS_ALLOW_METHODS: &str = "cors-allow-methods";

/// Prefix-aware view over a resource's raw annotations
#[derive(Debug, Clone, Copy)]
pub struct AnnotationReader<'a> {
    prefix: &'a str,
    annotations: &'a BTreeMap<String, String>,
}

impl<'a> AnnotationReader<'a> {
    pub fn new(prefix: &'a str, annotations: &'a BTreeMap<String, String>) -> Self {
        Self {
            prefix,
            annotations,
        }
    }

    /// Look up `<prefix><key>`
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.annotations
            .get(&format!("{}{}", self.prefix, key))
            .map(String::as_str)
    }

    /// Look up a key outside the controller prefix
    pub fn get_raw(&self, key: &str) -> Option<&'a str> {
        self.annotations.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_for(annotations: &BTreeMap<String, String>) -> AnnotationReader<'_> {
        AnnotationReader::new(DEFAULT_ANNOTATION_PREFIX, annotations)
    }

    #[test]
    fn test_reader_applies_prefix() {
        let mut annotations = BTreeMap::new();
        annotations.insert("k8s.apisix.apache.org/enable-cors".to_string(), "true".to_string());
        annotations.insert("enable-cors".to_string(), "bogus".to_string());
        annotations.insert(INGRESS_CLASS_ANNOTATION.to_string(), "apisix".to_string());

        let reader = AnnotationReader::new(DEFAULT_ANNOTATION_PREFIX, &annotations);
        assert_eq!(reader.get(ENABLE_CORS), Some("true"));
        assert_eq!(reader.get(CORS_ALLOW_ORIGIN), None);
        assert_eq!(reader.get_raw(INGRESS_CLASS_ANNOTATION), Some("apisix"));

        let other = AnnotationReader::new("example.com/", &annotations);
        assert_eq!(other.get(ENABLE_CORS), None);

        // the key is the whole remainder after the prefix
        annotations.insert("k8s.apisix.apache.org/cors-allow-origin-x".to_string(), "x".to_string());
        assert_eq!(reader_for(&annotations).get(CORS_ALLOW_ORIGIN), None);
    }
}
