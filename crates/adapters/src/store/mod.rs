// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence of the `Jenkins` resource under optimistic concurrency.
//!
//! Every write carries the `resourceVersion` it was read at; a stale write is
//! rejected with [`StoreError::Conflict`] and the caller must re-read.

mod k8s;

pub use k8s::KubeStatusStore;

use async_trait::async_trait;
use jop_core::{Jenkins, ResourceKey};
use thiserror::Error;

/// Errors from CR store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict writing {0}: object was modified")]
    Conflict(ResourceKey),
    #[error("{0} not found")]
    NotFound(ResourceKey),
    #[error("API error: {0}")]
    Api(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Adapter for reading and writing `Jenkins` resources
#[async_trait]
pub trait StatusStore: Clone + Send + Sync + 'static {
    async fn get(&self, key: &ResourceKey) -> Result<Jenkins, StoreError>;

    /// Replace the whole status subresource. Spec changes are ignored.
    async fn update_status(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError>;

    /// Replace the whole object. Status changes are ignored.
    async fn update(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStatusStore;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
