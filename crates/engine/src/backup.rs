// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup and restore driven by the status counters.
//!
//! `pendingBackup` names the next backup to take and `lastBackup` the last
//! one confirmed. A periodic trigger advances `pendingBackup` when nothing is
//! pending; each reconcile pass then calls [`BackupAndRestore::backup`],
//! which runs the backup command until the two counters agree again.

use crate::error::EngineError;
use jop_adapters::{JenkinsClient, PodExecutor, StatusStore, StoreError};
use jop_core::{Jenkins, JenkinsSpec, ResourceKey};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Read-modify-write attempts per timer tick before giving up until the next one.
const TICK_ATTEMPTS: u32 = 3;

/// Reloads configuration from disk after a restore.
const RELOAD_SCRIPT: &str = "Jenkins.instance.reload()";

struct Trigger {
    interval: u64,
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Registry {
    triggers: HashMap<ResourceKey, Trigger>,
    next_generation: u64,
}

/// Process-local periodic backup triggers, one per resource.
///
/// Not persisted: rebuilt from the spec on every pass. Ticks talk to the rest
/// of the system only through the store.
#[derive(Clone, Default)]
pub struct BackupScheduler {
    inner: Arc<Mutex<Registry>>,
}

impl BackupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a trigger for `key` every `interval` seconds, replacing one with a
    /// different interval. Must be called within a tokio runtime.
    pub fn ensure<S: StatusStore>(&self, key: &ResourceKey, interval: u64, store: S) {
        let mut registry = self.inner.lock();
        if let Some(existing) = registry.triggers.get(key) {
            if existing.interval == interval {
                return;
            }
            tracing::info!(%key, from = existing.interval, to = interval, "backup interval changed");
            existing.cancel.cancel();
        } else {
            tracing::info!(%key, interval, "starting backup trigger");
        }

        registry.next_generation += 1;
        let generation = registry.next_generation;
        let cancel = CancellationToken::new();
        registry
            .triggers
            .insert(key.clone(), Trigger { interval, generation, cancel: cancel.clone() });

        let scheduler = self.clone();
        let key = key.clone();
        let period = Duration::from_secs(interval.max(1));
        tokio::spawn(async move {
            scheduler.run(key, generation, period, cancel, store).await;
        });
    }

    pub fn stop(&self, key: &ResourceKey) {
        if let Some(trigger) = self.inner.lock().triggers.remove(key) {
            tracing::info!(%key, "stopping backup trigger");
            trigger.cancel.cancel();
        }
    }

    pub fn stop_all(&self) {
        let triggers: Vec<_> = self.inner.lock().triggers.drain().collect();
        for (key, trigger) in triggers {
            tracing::debug!(%key, "stopping backup trigger");
            trigger.cancel.cancel();
        }
    }

    pub fn is_running(&self, key: &ResourceKey) -> bool {
        self.inner.lock().triggers.contains_key(key)
    }

    #[cfg(test)]
    pub fn interval(&self, key: &ResourceKey) -> Option<u64> {
        self.inner.lock().triggers.get(key).map(|t| t.interval)
    }

    #[cfg(test)]
    pub fn keys(&self) -> HashSet<ResourceKey> {
        self.inner.lock().triggers.keys().cloned().collect()
    }

    async fn run<S: StatusStore>(
        self,
        key: ResourceKey,
        generation: u64,
        period: Duration,
        cancel: CancellationToken,
        store: S,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match request_backup(&store, &key).await {
                Ok(Some(pending)) => tracing::info!(%key, pending, "backup requested"),
                Ok(None) => tracing::debug!(%key, "backup already pending"),
                Err(e) if e.is_not_found() => {
                    tracing::info!(%key, "resource gone, stopping backup trigger");
                    self.forget(&key, generation);
                    break;
                }
                Err(e) => tracing::warn!(%key, error = %e, "backup trigger failed"),
            }
        }
    }

    /// Drop the entry only if it still belongs to this trigger.
    fn forget(&self, key: &ResourceKey, generation: u64) {
        let mut registry = self.inner.lock();
        if registry.triggers.get(key).is_some_and(|t| t.generation == generation) {
            registry.triggers.remove(key);
        }
    }
}

/// Advance `pendingBackup` if nothing is pending. Returns the new pending
/// number, or `None` when a backup was already pending.
async fn request_backup<S: StatusStore>(
    store: &S,
    key: &ResourceKey,
) -> Result<Option<u64>, StoreError> {
    let mut attempt = 1;
    loop {
        let mut cr = store.get(key).await?;
        let status = cr.status_mut();
        if status.pending_backup != status.last_backup {
            return Ok(None);
        }
        status.pending_backup += 1;
        let pending = status.pending_backup;
        match store.update_status(&cr).await {
            Ok(_) => return Ok(Some(pending)),
            Err(e) if e.is_conflict() && attempt < TICK_ATTEMPTS => {
                tracing::debug!(%key, attempt, "conflict bumping pending backup, re-reading");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Backup and restore operations for one resource at a time.
#[derive(Clone)]
pub struct BackupAndRestore<J, S, E> {
    jenkins: J,
    store: S,
    executor: E,
    scheduler: BackupScheduler,
}

impl<J, S, E> BackupAndRestore<J, S, E>
where
    J: JenkinsClient,
    S: StatusStore,
    E: PodExecutor,
{
    pub fn new(jenkins: J, store: S, executor: E, scheduler: BackupScheduler) -> Self {
        Self { jenkins, store, executor, scheduler }
    }

    /// Reconcile the trigger for `cr` against its backup interval.
    pub fn ensure_backup_trigger(&self, cr: &Jenkins) {
        let key = cr.key();
        let backup = &cr.spec.backup;
        if !backup.is_configured() || backup.interval == 0 {
            tracing::debug!(%key, "backup not configured, no trigger");
            self.scheduler.stop(&key);
            return;
        }
        self.scheduler.ensure(&key, backup.interval, self.store.clone());
    }

    pub fn stop_backup_trigger(&self, cr: &Jenkins) {
        self.scheduler.stop(&cr.key());
    }

    /// Take the pending backup, if any.
    ///
    /// On command failure nothing is written, so the same number is retried
    /// on the next pass.
    pub async fn backup(&self, cr: &mut Jenkins) -> Result<(), EngineError> {
        let backup = &cr.spec.backup;
        let Some(command) = backup.action.command().filter(|_| backup.is_configured()) else {
            tracing::debug!("backup not configured, skipping");
            return Ok(());
        };
        let status = cr.status_or_default();
        if status.pending_backup == status.last_backup {
            tracing::debug!(last = status.last_backup, "no backup pending");
            return Ok(());
        }

        let number = status.pending_backup;
        tracing::info!(key = %cr.key(), backup = number, "performing backup");
        self.run(cr, &backup.container_name, command, number).await?;

        let status = cr.status_mut();
        status.last_backup = number;
        if status.restored_backup == 0 {
            status.restored_backup = number;
        }
        *cr = self.store.update_status(cr).await?;
        tracing::info!(key = %cr.key(), backup = number, "backup finished");
        Ok(())
    }

    /// Restore the last (or pinned) backup into a fresh instance.
    ///
    /// Skipped once anything has been restored or when no backup exists yet.
    pub async fn restore(&self, cr: &mut Jenkins) -> Result<(), EngineError> {
        let restore = &cr.spec.restore;
        let Some(command) = restore.action.command().filter(|_| restore.is_configured()) else {
            tracing::debug!("restore not configured, skipping");
            return Ok(());
        };
        let status = cr.status_or_default();
        if status.restored_backup != 0 {
            if restore.recovery_once != 0 {
                self.clear_recovery_once(cr).await?;
            }
            tracing::debug!(restored = status.restored_backup, "backup already restored");
            return Ok(());
        }
        if status.last_backup == 0 {
            tracing::debug!("no backup to restore");
            return Ok(());
        }

        let number = match restore.recovery_once {
            0 => status.last_backup,
            pinned => pinned,
        };
        tracing::info!(key = %cr.key(), backup = number, "restoring backup");
        self.run(cr, &restore.container_name, command, number).await?;
        self.jenkins.execute_script(RELOAD_SCRIPT).await?;

        let status = cr.status_mut();
        status.restored_backup = number;
        status.pending_backup = number + 1;
        *cr = self.store.update_status(cr).await?;
        if cr.spec.restore.recovery_once != 0 {
            self.clear_recovery_once(cr).await?;
        }
        tracing::info!(key = %cr.key(), backup = number, "backup restored");
        Ok(())
    }

    /// Final backup while the automation server pod is going away.
    ///
    /// Stops the trigger, requests one backup (once per pod, see
    /// `JenkinsStatus::observe_master_pod`) and runs it.
    pub async fn backup_before_pod_deletion(&self, cr: &mut Jenkins) -> Result<(), EngineError> {
        self.stop_backup_trigger(cr);
        if !cr.spec.backup.make_backup_before_pod_deletion || !cr.spec.backup.is_configured() {
            return Ok(());
        }

        let status = cr.status_mut();
        if !status.backup_done_before_pod_deletion {
            if status.pending_backup == status.last_backup {
                status.pending_backup += 1;
            }
            status.backup_done_before_pod_deletion = true;
            *cr = self.store.update_status(cr).await?;
        }
        self.backup(cr).await
    }

    async fn run(
        &self,
        cr: &Jenkins,
        container: &str,
        command: &[String],
        number: u64,
    ) -> Result<(), EngineError> {
        let mut command = command.to_vec();
        command.push(number.to_string());
        let key = cr.key();
        let output = self
            .executor
            .exec(&key.namespace, &cr.master_pod_name(), container, &command)
            .await?;
        tracing::debug!(%key, stdout = %output.stdout, stderr = %output.stderr, "command output");
        Ok(())
    }

    async fn clear_recovery_once(&self, cr: &mut Jenkins) -> Result<(), EngineError> {
        cr.spec.restore.recovery_once = 0;
        *cr = self.store.update(cr).await?;
        Ok(())
    }
}

/// Problems with the backup and restore configuration, empty when valid.
pub fn validate(spec: &JenkinsSpec) -> Vec<String> {
    let containers: HashSet<&str> =
        spec.master.containers.iter().map(|c| c.name.as_str()).collect();
    let mut problems = Vec::new();

    let restore = &spec.restore;
    if restore.is_configured() {
        if !containers.contains(restore.container_name.as_str()) {
            problems.push(format!(
                "restore container '{}' not found in spec.master.containers",
                restore.container_name
            ));
        }
        if restore.action.command().is_none() {
            problems.push("spec.restore.action.exec is not configured".to_string());
        }
    }

    let backup = &spec.backup;
    if backup.is_configured() {
        if !containers.contains(backup.container_name.as_str()) {
            problems.push(format!(
                "backup container '{}' not found in spec.master.containers",
                backup.container_name
            ));
        }
        if backup.action.command().is_none() {
            problems.push("spec.backup.action.exec is not configured".to_string());
        }
        if backup.interval == 0 {
            problems.push("spec.backup.interval is not configured".to_string());
        }
    }

    if restore.is_configured() && !backup.is_configured() {
        problems.push("spec.backup.containerName is not configured".to_string());
    }
    if backup.is_configured() && !restore.is_configured() {
        problems.push("spec.restore.containerName is not configured".to_string());
    }
    problems
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
