//! Config sync: publishes route-table generations from the store.

use arc_swap::ArcSwap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ConfigStore;
use crate::router::RouteTable;

/// Shared, lock-free handle to the currently published route table
pub type RouteTableHandle = Arc<ArcSwap<RouteTable>>;

struct Publisher {
    store: Arc<ConfigStore>,
    table: RouteTableHandle,
    generation: AtomicU64,
    // Serialises snapshot + swap so generations are published in order
    publish_lock: Mutex<()>,
}

impl Publisher {
    fn publish(&self) -> u64 {
        let _guard = match self.publish_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Clear before the snapshot: a bind racing with us re-marks dirty
        // and is picked up on the next tick.
        self.store.take_dirty();
        let routes = self.store.snapshot();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.table.store(Arc::new(RouteTable::new(generation, routes)));
        info!(generation, resources = self.store.len(), "route table published");
        generation
    }
}

/// Asynchronous publisher of the store's contents to the gateway
///
/// With [`ConfigSync::start`] a background thread checks the store every
/// interval and publishes a new [`RouteTable`] generation when it is dirty.
/// Bursts of binds within one interval coalesce into one generation.
/// [`ConfigSync::flush`] publishes immediately from the calling thread.
pub struct ConfigSync {
    publisher: Arc<Publisher>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ConfigSync {
    /// Create a sync with no background thread; publish with [`flush`](Self::flush)
    #[must_use]
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            publisher: Arc::new(Publisher {
                store,
                table: Arc::new(ArcSwap::from_pointee(RouteTable::empty())),
                generation: AtomicU64::new(0),
                publish_lock: Mutex::new(()),
            }),
            shutdown: None,
            worker: None,
        }
    }

    /// Create a sync and spawn its `config-sync` thread
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(store: Arc<ConfigStore>, interval: Duration) -> io::Result<Self> {
        let mut sync = Self::new(store);
        let (tx, rx) = mpsc::channel::<()>();
        let publisher = Arc::clone(&sync.publisher);

        let worker = std::thread::Builder::new()
            .name("config-sync".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis(), "config sync started");
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if publisher.store.take_dirty() {
                                publisher.publish();
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("config sync stopped");
            })?;

        sync.shutdown = Some(tx);
        sync.worker = Some(worker);
        Ok(sync)
    }

    /// Handle the gateway reads snapshots from
    #[must_use]
    pub fn table(&self) -> RouteTableHandle {
        Arc::clone(&self.publisher.table)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.publisher.store
    }

    /// Publish the store now, returning the new generation
    pub fn flush(&self) -> u64 {
        self.publisher.publish()
    }

    /// Generation of the most recently published table
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.publisher.generation.load(Ordering::Acquire)
    }

    /// Stop the background thread, if any
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            if tx.send(()).is_err() {
                debug!("config sync thread already gone");
            }
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("config sync thread panicked");
            }
        }
    }
}

impl Drop for ConfigSync {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ConfigSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSync")
            .field("generation", &self.generation())
            .field("running", &self.worker.is_some())
            .finish()
    }
}
