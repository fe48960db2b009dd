//! Concurrent reconciliation against the store and config sync.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use corsgate::annotations::CorsPolicy;
use corsgate::ingress::{BackendPort, BackendRef, IngressIntent, IngressKey, IntentRule, PathMatchKind};
use corsgate::middleware::evaluate;
use corsgate::{ConfigStore, ConfigSync};

fn intent(name: &str, paths: usize) -> IngressIntent {
    IngressIntent {
        key: IngressKey::new("default", name),
        annotations: BTreeMap::new(),
        ingress_class: None,
        rules: (0..paths)
            .map(|i| IntentRule {
                host: Some(format!("{name}.example.com")),
                path: format!("/p{i}"),
                path_match_kind: PathMatchKind::Prefix,
                backend: BackendRef {
                    service_name: name.to_string(),
                    port: BackendPort::Number(80),
                },
            })
            .collect(),
        default_backend: None,
    }
}

fn policy(origin: &str) -> CorsPolicy {
    CorsPolicy {
        enabled: true,
        allowed_origins: vec![origin.to_string()],
        allowed_methods: format!("GET-{origin}"),
        allowed_headers: format!("x-{origin}"),
    }
}

#[test]
fn test_same_resource_writes_are_never_torn() {
    let store = Arc::new(ConfigStore::new());
    let sync = Arc::new(ConfigSync::start(Arc::clone(&store), Duration::from_millis(1)).unwrap());
    let ing = intent("shared", 4);
    store.bind(&ing, policy("https://w0.com"));
    sync.flush();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            let ing = ing.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    store.bind(&ing, policy(&format!("https://w{w}-{i}.com")));
                }
            })
        })
        .collect();

    let table = sync.table();
    let deadline = Instant::now() + Duration::from_millis(300);
    while Instant::now() < deadline {
        let snapshot = table.load();
        let routes: Vec<_> = snapshot.routes().collect();
        assert_eq!(routes.len(), 4);
        // every route of the resource carries the very same policy object
        for route in &routes {
            assert!(Arc::ptr_eq(&route.cors, &routes[0].cors));
        }
        // and that policy's fields belong together
        let cors = &routes[0].cors;
        let origin = &cors.allowed_origins[0];
        assert_eq!(cors.allowed_methods, format!("GET-{origin}"));
        assert_eq!(cors.allowed_headers, format!("x-{origin}"));
    }

    for writer in writers {
        writer.join().unwrap();
    }

    // last write wins: the final snapshot equals the store's final binding
    sync.flush();
    let stored = store.policy(&ing.key).unwrap();
    let published = table.load();
    let route = published.route("shared.example.com", "/p0").unwrap();
    assert_eq!(*route.route.cors, *stored);
}

#[test]
fn test_different_resources_reconcile_in_parallel() {
    let store = Arc::new(ConfigStore::new());
    let handles: Vec<_> = (0..8)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let ing = intent(&format!("svc{n}"), 2);
                store.bind(&ing, policy(&format!("https://svc{n}.com")));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let sync = ConfigSync::new(Arc::clone(&store));
    sync.flush();
    let table = sync.table().load_full();
    assert_eq!(table.len(), 16);

    for n in 0..8 {
        let m = table.route(&format!("svc{n}.example.com"), "/p1/x").unwrap();
        let origin = format!("https://svc{n}.com");
        assert!(evaluate(&m.route.cors, Some(&origin)).headers().is_some());
        let other = format!("https://svc{}.com", (n + 1) % 8);
        assert!(evaluate(&m.route.cors, Some(&other)).headers().is_none());
    }
}
