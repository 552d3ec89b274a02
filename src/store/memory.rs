use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::RwLock;

use super::{ParameterStore, StoreError};

/// An in-process parameter store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parameters: RwLock<HashMap<String, String>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to this store.
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.write().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.parameters.write().remove(name)
    }

    /// Number of [`get`](ParameterStore::get) calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ParameterStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<String, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.parameters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(name))
    }
}
