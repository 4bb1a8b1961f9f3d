// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory CR store for tests.

use super::{StatusStore, StoreError};
use async_trait::async_trait;
use jop_core::{Jenkins, JenkinsStatus, ResourceKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct FakeStoreState {
    objects: HashMap<ResourceKey, Jenkins>,
    next_version: u64,
    injected_conflicts: u32,
    status_writes: usize,
    spec_writes: usize,
}

impl FakeStoreState {
    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    /// Check the write's resource version against the stored object.
    fn check(&mut self, jenkins: &Jenkins) -> Result<ResourceKey, StoreError> {
        let key = jenkins.key();
        if self.injected_conflicts > 0 {
            self.injected_conflicts -= 1;
            return Err(StoreError::Conflict(key));
        }
        let stored = self.objects.get(&key).ok_or_else(|| StoreError::NotFound(key.clone()))?;
        match &jenkins.metadata.resource_version {
            Some(rv) if stored.metadata.resource_version.as_ref() != Some(rv) => {
                Err(StoreError::Conflict(key))
            }
            _ => Ok(key),
        }
    }
}

/// Fake store with monotonically increasing resource versions.
///
/// Writes carrying a stale `resourceVersion` fail with `Conflict`, like the
/// API server. Status and spec are replaced independently, as with a status
/// subresource.
#[derive(Clone)]
pub struct FakeStatusStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl Default for FakeStatusStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeStoreState {
                objects: HashMap::new(),
                next_version: 0,
                injected_conflicts: 0,
                status_writes: 0,
                spec_writes: 0,
            })),
        }
    }
}

impl FakeStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, assigning a fresh resource version. Returns the stored copy.
    pub fn insert(&self, mut jenkins: Jenkins) -> Jenkins {
        let mut state = self.inner.lock();
        jenkins.metadata.resource_version = Some(state.bump());
        state.objects.insert(jenkins.key(), jenkins.clone());
        jenkins
    }

    pub fn remove(&self, key: &ResourceKey) {
        self.inner.lock().objects.remove(key);
    }

    /// Current stored copy, without going through the trait.
    pub fn snapshot(&self, key: &ResourceKey) -> Option<Jenkins> {
        self.inner.lock().objects.get(key).cloned()
    }

    pub fn status(&self, key: &ResourceKey) -> JenkinsStatus {
        self.snapshot(key).map(|j| j.status_or_default()).unwrap_or_default()
    }

    /// Apply a change as a concurrent writer would, bumping the resource version.
    pub fn modify_status(&self, key: &ResourceKey, f: impl FnOnce(&mut JenkinsStatus)) {
        let mut state = self.inner.lock();
        let version = state.bump();
        if let Some(jenkins) = state.objects.get_mut(key) {
            f(jenkins.status_mut());
            jenkins.metadata.resource_version = Some(version);
        }
    }

    /// Reject the next `n` writes with `Conflict`.
    pub fn inject_conflicts(&self, n: u32) {
        self.inner.lock().injected_conflicts = n;
    }

    pub fn status_writes(&self) -> usize {
        self.inner.lock().status_writes
    }

    pub fn spec_writes(&self) -> usize {
        self.inner.lock().spec_writes
    }
}

#[async_trait]
impl StatusStore for FakeStatusStore {
    async fn get(&self, key: &ResourceKey) -> Result<Jenkins, StoreError> {
        self.snapshot(key).ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn update_status(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError> {
        let mut state = self.inner.lock();
        let key = state.check(jenkins)?;
        let version = state.bump();
        state.status_writes += 1;
        let stored = state.objects.get_mut(&key).ok_or_else(|| StoreError::NotFound(key.clone()))?;
        stored.status = jenkins.status.clone();
        stored.metadata.resource_version = Some(version);
        Ok(stored.clone())
    }

    async fn update(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError> {
        let mut state = self.inner.lock();
        let key = state.check(jenkins)?;
        let version = state.bump();
        state.spec_writes += 1;
        let stored = state.objects.get_mut(&key).ok_or_else(|| StoreError::NotFound(key.clone()))?;
        stored.spec = jenkins.spec.clone();
        stored.metadata.labels = jenkins.metadata.labels.clone();
        stored.metadata.annotations = jenkins.metadata.annotations.clone();
        stored.metadata.resource_version = Some(version);
        Ok(stored.clone())
    }
}
