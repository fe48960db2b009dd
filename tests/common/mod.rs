#![allow(dead_code)]

use std::sync::Arc;

use corsgate::gateway::{Backend, Gateway, GatewayRequest, GatewayResponse};
use corsgate::ingress::BackendRef;
use corsgate::store::RouteTableHandle;

pub mod temp_files {
    use std::io::Write;

    /// Write `content` to a fresh temporary file that is removed on drop
    pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("corsgate_test_")
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}

pub mod manifests {
    /// The three supported Ingress schemas
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Schema {
        NetworkingV1,
        NetworkingV1Beta1,
        ExtensionsV1Beta1,
    }

    pub const ALL_SCHEMAS: [Schema; 3] = [
        Schema::NetworkingV1,
        Schema::NetworkingV1Beta1,
        Schema::ExtensionsV1Beta1,
    ];

    fn annotation_block(annotations: &[(&str, &str)]) -> String {
        let mut block = String::from("    kubernetes.io/ingress.class: apisix\n");
        for (key, value) in annotations {
            block.push_str(&format!("    {key}: \"{value}\"\n"));
        }
        block
    }

    /// An httpbin Ingress routing `host` + `path` in the given schema
    pub fn httpbin_ingress(
        schema: Schema,
        name: &str,
        host: &str,
        path: &str,
        annotations: &[(&str, &str)],
    ) -> String {
        let annotations = annotation_block(annotations);
        match schema {
            Schema::NetworkingV1 => format!(
                r#"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: {name}
  annotations:
{annotations}spec:
  rules:
    - host: {host}
      http:
        paths:
          - path: {path}
            pathType: Exact
            backend:
              service:
                name: httpbin-service-e2e-test
                port:
                  number: 80
"#
            ),
            Schema::NetworkingV1Beta1 | Schema::ExtensionsV1Beta1 => {
                let api_version = if schema == Schema::NetworkingV1Beta1 {
                    "networking.k8s.io/v1beta1"
                } else {
                    "extensions/v1beta1"
                };
                format!(
                    r#"apiVersion: {api_version}
kind: Ingress
metadata:
  name: {name}
  annotations:
{annotations}spec:
  rules:
    - host: {host}
      http:
        paths:
          - path: {path}
            pathType: Exact
            backend:
              serviceName: httpbin-service-e2e-test
              servicePort: 80
"#
                )
            }
        }
    }

    pub const PREFIX: &str = "k8s.apisix.apache.org/";

    /// Annotations of the CORS scenario, with `enable-cors` set to `enabled`
    pub fn cors_annotations(enabled: &str) -> Vec<(String, String)> {
        vec![
            (format!("{PREFIX}enable-cors"), enabled.to_string()),
            (
                format!("{PREFIX}cors-allow-origin"),
                "https://foo.com,https://bar.com".to_string(),
            ),
            (format!("{PREFIX}cors-allow-methods"), "GET,POST,PUT".to_string()),
            (format!("{PREFIX}cors-allow-headers"), "x-foo-1,x-foo-2".to_string()),
        ]
    }

    pub fn as_refs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

/// httpbin-like upstream: echoes the route's backend and never sets CORS headers
pub struct HttpbinBackend;

impl Backend for HttpbinBackend {
    fn call(&self, backend: &BackendRef, req: &GatewayRequest) -> GatewayResponse {
        let body = format!("{{\"origin\": \"{}\", \"path\": \"{}\"}}", req.host, req.path);
        let mut res = GatewayResponse::new(200, Default::default(), body.into_bytes());
        res.set_header("Content-Type", "application/json".to_string());
        res.set_header("X-Upstream", backend.to_string());
        res
    }
}

pub fn httpbin_gateway(table: RouteTableHandle) -> Gateway {
    Gateway::new(table, Arc::new(HttpbinBackend))
}

/// Names of the `access-control-*` headers on a response, lowercased and sorted
pub fn cors_header_names(res: &GatewayResponse) -> Vec<String> {
    let mut names: Vec<String> = res
        .headers_with_prefix("access-control-")
        .map(|(k, _)| k.to_ascii_lowercase())
        .collect();
    names.sort();
    names
}
