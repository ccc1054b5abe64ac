//! In-memory cache backend that records every call, for tests

use crate::build::{BuildLabel, BuildMetadata, BuildTarget};
use crate::cache::Cache;
use crate::error::{PlzError, PlzResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Store(BuildLabel),
    Retrieve(BuildLabel),
    Clean(BuildLabel),
    CleanAll,
}

#[derive(Default)]
pub(crate) struct RecordingCache {
    entries: Mutex<HashMap<(BuildLabel, Vec<u8>), BuildMetadata>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Semaphore>,
    started: AtomicUsize,
    fail_stores: bool,
    panic_stores: bool,
}

impl RecordingCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores block until `open_gate` hands out permits
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_stores: true,
            ..Self::default()
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panic_stores: true,
            ..Self::default()
        }
    }

    pub(crate) fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn stored_labels(&self) -> Vec<BuildLabel> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Store(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn cleaned_labels(&self) -> Vec<BuildLabel> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Clean(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn contains(&self, label: &BuildLabel, key: &[u8]) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&(label.clone(), key.to_vec()))
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Number of store calls that have entered the backend
    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Poll until `n` stores have entered the backend
    pub(crate) async fn wait_for_started(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.started() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stores did not start in time");
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn store(
        &self,
        target: Arc<BuildTarget>,
        key: Vec<u8>,
        metadata: BuildMetadata,
        _files: Vec<PathBuf>,
    ) -> PlzResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.panic_stores {
            panic!("backend exploded storing {}", target.label);
        }

        self.record(Call::Store(target.label.clone()));
        if self.fail_stores {
            return Err(PlzError::Internal("backend unavailable".to_string()));
        }

        self.entries
            .lock()
            .unwrap()
            .insert((target.label.clone(), key), metadata);
        Ok(())
    }

    async fn retrieve(
        &self,
        target: &BuildTarget,
        key: &[u8],
        _files: &[PathBuf],
    ) -> PlzResult<Option<BuildMetadata>> {
        self.record(Call::Retrieve(target.label.clone()));
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(target.label.clone(), key.to_vec()))
            .cloned())
    }

    async fn clean(&self, target: &BuildTarget) -> PlzResult<()> {
        self.record(Call::Clean(target.label.clone()));
        self.entries
            .lock()
            .unwrap()
            .retain(|(label, _), _| *label != target.label);
        Ok(())
    }

    async fn clean_all(&self) -> PlzResult<()> {
        self.record(Call::CleanAll);
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
