use serde::Serialize;
use std::sync::Arc;

use crate::annotations::CorsPolicy;
use crate::ingress::{BackendRef, IngressIntent, IngressKey, PathMatchKind};

/// Internal route object pushed to the gateway
///
/// One per rule path of an Ingress resource. Every route of a resource
/// shares the resource's [`CorsPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundRoute {
    /// `namespace/name#index`, stable across reconciliations of the same rules
    pub id: String,
    pub resource: IngressKey,
    /// `None` matches any host
    pub host: Option<String>,
    pub path: String,
    pub path_match_kind: PathMatchKind,
    pub backend: BackendRef,
    pub cors: Arc<CorsPolicy>,
}

/// Everything the store holds for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBinding {
    pub policy: Arc<CorsPolicy>,
    pub routes: Arc<[BoundRoute]>,
}

impl ResourceBinding {
    /// Build the complete binding of a resource from its intent and policy
    pub fn from_intent(intent: &IngressIntent, policy: CorsPolicy) -> Self {
        let policy = Arc::new(policy);
        let routes: Vec<BoundRoute> = intent
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| BoundRoute {
                id: format!("{}#{}", intent.key, index),
                resource: intent.key.clone(),
                host: rule.host.clone(),
                path: rule.path.clone(),
                path_match_kind: rule.path_match_kind,
                backend: rule.backend.clone(),
                cors: Arc::clone(&policy),
            })
            .collect();

        Self {
            policy,
            routes: routes.into(),
        }
    }
}
