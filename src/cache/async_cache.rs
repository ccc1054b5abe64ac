//! Asynchronous cache proxy
//!
//! Wraps a [`Cache`] so that stores are queued and applied by a fixed pool
//! of background workers while the caller carries on. If the queue fills up,
//! callers block until a worker frees a slot. Retrieval and cleaning are
//! passed straight through to the wrapped cache.
//!
//! `shutdown` must be called before the proxy is dropped; it closes the
//! queue and waits for every queued store to be applied.

use crate::build::{BuildMetadata, BuildTarget};
use crate::cache::Cache;
use crate::config::schema::CacheConfig;
use crate::error::{PlzError, PlzResult};
use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// A store call waiting on the queue
#[derive(Debug)]
pub struct StoreRequest {
    /// Target whose outputs are being stored
    pub target: Arc<BuildTarget>,
    /// Fingerprint of the action's inputs
    pub key: Vec<u8>,
    /// Result descriptor of the build action
    pub metadata: BuildMetadata,
    /// Output files, relative to the workspace root
    pub files: Vec<PathBuf>,
}

/// Count of stores accepted but not yet applied
#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    drained: Notify,
}

impl Pending {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    async fn wait_drained(&self) {
        loop {
            // Register before checking so a concurrent `done` can't be missed
            let notified = self.drained.notified();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Cache proxy that applies stores on background workers
pub struct AsyncCache {
    requests: Mutex<Option<mpsc::Sender<StoreRequest>>>,
    workers: AsyncMutex<JoinSet<()>>,
    real_cache: Arc<dyn Cache>,
    pending: Arc<Pending>,
    worker_count: usize,
}

impl AsyncCache {
    /// Wrap `real_cache` and start `config.workers` workers
    ///
    /// Must be called from within a tokio runtime. The queue holds
    /// `config.queue_depth` requests (at least one) beyond those the
    /// workers are currently applying.
    pub fn new(real_cache: Arc<dyn Cache>, config: &CacheConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        let rx = Arc::new(AsyncMutex::new(rx));
        let pending = Arc::new(Pending::default());

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            workers.spawn(run(
                id,
                Arc::clone(&rx),
                Arc::clone(&real_cache),
                Arc::clone(&pending),
            ));
        }
        debug!("Started {} cache worker(s)", worker_count);

        Self {
            requests: Mutex::new(Some(tx)),
            workers: AsyncMutex::new(workers),
            real_cache,
            pending,
            worker_count,
        }
    }

    /// Number of background workers
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stores accepted but not yet applied to the wrapped cache
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    fn sender(&self) -> Option<mpsc::Sender<StoreRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Cache for AsyncCache {
    /// Queue a store, blocking only while the queue is full
    ///
    /// Returning `Ok` means the request was queued, not that it was stored;
    /// failures of the wrapped cache are logged by the worker.
    async fn store(
        &self,
        target: Arc<BuildTarget>,
        key: Vec<u8>,
        metadata: BuildMetadata,
        files: Vec<PathBuf>,
    ) -> PlzResult<()> {
        let Some(requests) = self.sender() else {
            return Err(PlzError::CacheShutDown(target.label.to_string()));
        };

        let permit = match requests.reserve().await {
            Ok(permit) => permit,
            Err(_) => return Err(PlzError::CacheShutDown(target.label.to_string())),
        };

        self.pending.add();
        permit.send(StoreRequest {
            target,
            key,
            metadata,
            files,
        });
        Ok(())
    }

    async fn retrieve(
        &self,
        target: &BuildTarget,
        key: &[u8],
        files: &[PathBuf],
    ) -> PlzResult<Option<BuildMetadata>> {
        self.real_cache.retrieve(target, key, files).await
    }

    async fn clean(&self, target: &BuildTarget) -> PlzResult<()> {
        self.real_cache.clean(target).await
    }

    async fn clean_all(&self) -> PlzResult<()> {
        self.real_cache.clean_all().await
    }

    /// Wait until no stores are pending
    ///
    /// Stores queued by other callers while this waits extend the wait.
    async fn flush(&self) {
        if self.pending() > 0 {
            debug!("Waiting for {} pending cache store(s)", self.pending());
        }
        self.pending.wait_drained().await;
    }

    /// Close the queue and wait for the workers to drain it
    async fn shutdown(&self) {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match requests {
            Some(requests) => {
                info!("Shutting down cache workers...");
                drop(requests);
            }
            None => debug!("Cache queue already closed"),
        }

        let mut workers = self.workers.lock().await;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Cache worker failed: {}", e);
            }
        }
        debug!("Shut down all cache workers");
    }
}

impl Drop for AsyncCache {
    fn drop(&mut self) {
        let open = self
            .requests
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        let pending = self.pending.get();
        if open && pending > 0 {
            warn!(
                "Cache dropped without shutdown; {} pending store(s) abandoned",
                pending
            );
        }
    }
}

/// Worker loop: apply requests until the queue is closed and empty
async fn run(
    id: usize,
    requests: Arc<AsyncMutex<mpsc::Receiver<StoreRequest>>>,
    real_cache: Arc<dyn Cache>,
    pending: Arc<Pending>,
) {
    loop {
        let next = requests.lock().await.recv().await;
        let Some(request) = next else {
            break;
        };
        apply(real_cache.as_ref(), request).await;
        pending.done();
    }
    debug!("Cache worker {} finished", id);
}

async fn apply(real_cache: &dyn Cache, request: StoreRequest) {
    let label = request.target.label.clone();
    let store = real_cache.store(
        request.target,
        request.key,
        request.metadata,
        request.files,
    );

    match AssertUnwindSafe(store).catch_unwind().await {
        Ok(Ok(())) => debug!("Stored {} in cache", label),
        Ok(Err(e)) => warn!("Failed to store {} in cache: {}", label, e),
        Err(_) => error!("Cache backend panicked while storing {}", label),
    }
}
