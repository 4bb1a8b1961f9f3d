// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StatusStore` backed by the Kubernetes API server.

use super::{StatusStore, StoreError};
use async_trait::async_trait;
use jop_core::{Jenkins, ResourceKey};
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};

#[derive(Clone)]
pub struct KubeStatusStore {
    client: Client,
}

impl KubeStatusStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Jenkins> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map API errors, surfacing 409 and 404 as typed variants.
pub(super) fn map_error(key: &ResourceKey, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(key.clone()),
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(key.clone()),
        other => StoreError::Api(other.to_string()),
    }
}

#[async_trait]
impl StatusStore for KubeStatusStore {
    async fn get(&self, key: &ResourceKey) -> Result<Jenkins, StoreError> {
        self.api(&key.namespace).get(&key.name).await.map_err(|e| map_error(key, e))
    }

    async fn update_status(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError> {
        let key = jenkins.key();
        let data = serde_json::to_vec(jenkins).map_err(|e| StoreError::Encode(e.to_string()))?;
        let updated = self
            .api(&key.namespace)
            .replace_status(&jenkins.name_any(), &PostParams::default(), data)
            .await
            .map_err(|e| map_error(&key, e))?;
        tracing::debug!(
            %key,
            resource_version = %updated.resource_version().unwrap_or_default(),
            "status updated"
        );
        Ok(updated)
    }

    async fn update(&self, jenkins: &Jenkins) -> Result<Jenkins, StoreError> {
        let key = jenkins.key();
        self.api(&key.namespace)
            .replace(&jenkins.name_any(), &PostParams::default(), jenkins)
            .await
            .map_err(|e| map_error(&key, e))
    }
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
