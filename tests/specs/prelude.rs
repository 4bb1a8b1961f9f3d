// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared world for scenarios: the external systems outlive any one
//! operator process.

pub use jop_adapters::{
    FakeJenkinsClient, FakePodExecutor, FakeStatusStore, JenkinsCall, StatusStore,
};
pub use jop_core::{test_support, FakeClock, Jenkins, JenkinsStatus, ResourceKey};
pub use jop_engine::{
    add_secrets_loader, is_groovy, BackupAndRestore, BackupScheduler, EngineError, Groovy, Jobs,
    ScriptSource, BUILD_RETRIES,
};
pub use std::collections::BTreeMap;
pub use std::time::Duration;

pub const CONFIG_JOB: &str = "jop-user-configuration";
pub const CONFIG_TYPE: &str = "user-groovy";

/// Automation server, cluster store, and sidecar exec, shared across restarts.
pub struct World {
    pub jenkins: FakeJenkinsClient,
    pub store: FakeStatusStore,
    pub executor: FakePodExecutor,
    pub clock: FakeClock,
    pub key: ResourceKey,
}

impl World {
    pub fn new(cr: Jenkins) -> Self {
        let store = FakeStatusStore::new();
        let key = store.insert(cr).key();
        Self {
            jenkins: FakeJenkinsClient::new(),
            store,
            executor: FakePodExecutor::new(),
            clock: FakeClock::new(),
            key,
        }
    }

    /// Start a fresh operator process with no in-memory state.
    pub fn start_operator(&self) -> Operator {
        let scheduler = BackupScheduler::new();
        Operator {
            jobs: Jobs::new(self.jenkins.clone(), self.store.clone(), self.clock.clone()),
            groovy: Groovy::new(
                self.jenkins.clone(),
                self.store.clone(),
                self.clock.clone(),
                CONFIG_TYPE,
                CONFIG_JOB,
            ),
            backups: BackupAndRestore::new(
                self.jenkins.clone(),
                self.store.clone(),
                self.executor.clone(),
                scheduler.clone(),
            ),
            scheduler,
            store: self.store.clone(),
            key: self.key.clone(),
        }
    }

    pub fn status(&self) -> JenkinsStatus {
        self.store.status(&self.key)
    }
}

pub struct Operator {
    pub jobs: Jobs<FakeJenkinsClient, FakeStatusStore, FakeClock>,
    pub groovy: Groovy<FakeJenkinsClient, FakeStatusStore, FakeClock>,
    pub backups: BackupAndRestore<FakeJenkinsClient, FakeStatusStore, FakePodExecutor>,
    pub scheduler: BackupScheduler,
    store: FakeStatusStore,
    key: ResourceKey,
}

impl Operator {
    /// Every pass starts from a fresh read, as the controller does.
    pub async fn read(&self) -> Jenkins {
        self.store.get(&self.key).await.unwrap()
    }
}

pub fn source(name: &str, entries: &[(&str, &str)]) -> ScriptSource {
    ScriptSource::new(name, entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
}
