//! # Hot Reload Module
//!
//! Watches a manifest file and reconciles its resources whenever it changes.
//! This stands in for a Kubernetes watch during local runs: the file is the
//! complete desired resource set.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use corsgate::hot_reload::watch_manifests;
//!
//! let watcher = watch_manifests("ingresses.yaml", controller.clone(), sync.clone())?;
//! // Keep `watcher` alive for as long as reloads should happen
//! ```
//!
//! ## Reload Process
//!
//! 1. **Detection**: a create or modify event arrives for the file
//! 2. **Load**: every document in the file is decoded
//! 3. **Reconcile**: [`Controller::sync_all`] binds present resources and
//!    unbinds absent ones
//! 4. **Publish**: the config sync is flushed so the gateway sees the result
//!
//! If the file cannot be read the error is logged and the previous
//! configuration stays active.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::controller::{Controller, SyncReport};
use crate::ingress::{load_manifest_file, IngressError};
use crate::store::ConfigSync;

/// Load `path` and reconcile its resources, publishing the result
///
/// # Errors
///
/// Returns [`IngressError::Io`] if the file cannot be read; nothing is
/// reconciled in that case.
pub fn reload_manifests(
    path: &Path,
    controller: &Controller,
    sync: &ConfigSync,
) -> Result<SyncReport, IngressError> {
    let documents = load_manifest_file(path)?;
    let report = controller.sync_all(documents);
    let generation = sync.flush();
    info!(
        path = %path.display(),
        generation,
        applied = report.applied.len(),
        removed = report.removed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "hot-reload: manifests applied"
    );
    Ok(report)
}

/// Watch a manifest file and reconcile it on every change
///
/// The watcher stops when the returned handle is dropped.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn watch_manifests<P>(
    path: P,
    controller: Controller,
    sync: Arc<ConfigSync>,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    if let Err(e) = reload_manifests(&watch_path, &controller, &sync) {
                        error!(error = %e, "hot-reload: keeping previous configuration");
                    }
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "hot-reload: watching manifests");
    Ok(watcher)
}
