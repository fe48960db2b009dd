use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::ControllerConfig;
use crate::controller::{Controller, ReconcileOutcome};
use crate::gateway::{Gateway, GatewayRequest, GatewayResponse};
use crate::hot_reload::{reload_manifests, watch_manifests};
use crate::ingress::{load_manifest_file, BackendRef};
use crate::store::{ConfigStore, ConfigSync};

/// Command-line interface for corsgate
#[derive(Debug, Parser)]
#[command(name = "corsgate")]
#[command(about = "Annotation-driven CORS policy translation for Ingress resources", long_about = None)]
pub struct Cli {
    /// Controller configuration file (YAML); `CORSGATE_*` variables override it
    #[arg(long, global = true, env = "CORSGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available corsgate commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize every resource in a manifest and print its bound routes and CORS policy
    Check {
        /// Manifest file (YAML, multi-document, or JSON)
        #[arg(short, long)]
        manifests: PathBuf,
    },
    /// Bind a manifest and print the CORS headers one request would receive
    Evaluate {
        #[arg(short, long)]
        manifests: PathBuf,

        /// Request `Host`
        #[arg(long)]
        host: String,

        /// Request path
        #[arg(long, default_value = "/")]
        path: String,

        /// Request `Origin`; omitted means no Origin header
        #[arg(long)]
        origin: Option<String>,

        /// Request method
        #[arg(long, default_value = "GET")]
        method: String,
    },
    /// Reconcile a manifest and keep reconciling it on every change
    Watch {
        #[arg(short, long)]
        manifests: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    match path {
        Some(path) => ControllerConfig::load(path),
        None => Ok(ControllerConfig::from_env()),
    }
}

fn write_json(out: &mut dyn Write, value: &Value) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Run a parsed command, writing results to `out`
///
/// Returns `Ok(false)` when `check` found documents that could not be
/// decoded; the binary turns that into a non-zero exit status.
///
/// # Errors
///
/// Returns an error if the configuration or a manifest file cannot be read.
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    let config = Arc::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Commands::Check { manifests } => check(config, &manifests, out),
        Commands::Evaluate {
            manifests,
            host,
            path,
            origin,
            method,
        } => {
            let method: Method = method
                .parse()
                .with_context(|| format!("invalid method '{method}'"))?;
            evaluate(config, &manifests, method, &host, &path, origin.as_deref(), out)?;
            Ok(true)
        }
        Commands::Watch { manifests } => {
            watch(config, &manifests)?;
            Ok(true)
        }
    }
}

fn check(config: Arc<ControllerConfig>, manifests: &Path, out: &mut dyn Write) -> anyhow::Result<bool> {
    let documents = load_manifest_file(manifests)?;
    let controller = Controller::new(config, Arc::new(ConfigStore::new()));

    let mut resources = Vec::new();
    let mut errors = Vec::new();
    for document in documents {
        let ingress = match document {
            Ok(ingress) => ingress,
            Err(e) => {
                errors.push(Value::String(e.to_string()));
                continue;
            }
        };
        let key = ingress.key();
        let entry = match controller.apply(&ingress) {
            ReconcileOutcome::Bound(_) => {
                let binding = controller.store().get(&key);
                json!({
                    "resource": key.to_string(),
                    "schema": ingress.schema().api_version(),
                    "selected": true,
                    "cors": binding.as_ref().map(|b| &*b.policy),
                    "routes": binding.as_ref().map(|b| &*b.routes),
                })
            }
            ReconcileOutcome::Ignored { reason } => json!({
                "resource": key.to_string(),
                "schema": ingress.schema().api_version(),
                "selected": false,
                "reason": reason,
            }),
        };
        resources.push(entry);
    }

    let ok = errors.is_empty();
    write_json(out, &json!({ "resources": resources, "errors": errors }))?;
    Ok(ok)
}

fn evaluate(
    config: Arc<ControllerConfig>,
    manifests: &Path,
    method: Method,
    host: &str,
    path: &str,
    origin: Option<&str>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let documents = load_manifest_file(manifests)?;
    let store = Arc::new(ConfigStore::new());
    let controller = Controller::new(config, Arc::clone(&store));
    controller.sync_all(documents);

    let sync = ConfigSync::new(store);
    let generation = sync.flush();
    let table = sync.table();
    let gateway = Gateway::new(
        Arc::clone(&table),
        Arc::new(|_: &BackendRef, _: &GatewayRequest| GatewayResponse::empty(200)),
    );

    let mut request = GatewayRequest::new(method, host, path, Default::default());
    if let Some(origin) = origin {
        request = request.with_header("Origin", origin);
    }
    let response = gateway.handle(&request);
    let route = table.load().route(host, path).map(|m| m.route.id.clone());

    let headers: Map<String, Value> = response
        .headers_with_prefix("access-control-")
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

    write_json(
        out,
        &json!({
            "generation": generation,
            "route": route,
            "status": response.status,
            "headers": headers,
        }),
    )
}

fn watch(config: Arc<ControllerConfig>, manifests: &Path) -> anyhow::Result<()> {
    let store = Arc::new(ConfigStore::new());
    let controller = Controller::new(Arc::clone(&config), Arc::clone(&store));
    let sync = Arc::new(
        ConfigSync::start(store, config.sync_interval()).context("starting config sync")?,
    );

    reload_manifests(manifests, &controller, &sync)
        .with_context(|| format!("loading {}", manifests.display()))?;
    let _watcher = watch_manifests(manifests, controller, Arc::clone(&sync))
        .with_context(|| format!("watching {}", manifests.display()))?;

    info!(manifests = %manifests.display(), "controller running; press Ctrl-C to stop");
    loop {
        std::thread::park();
    }
}
