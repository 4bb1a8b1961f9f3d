// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One reconcile pass over a `Jenkins` resource.
//!
//! Every step is idempotent and keeps its progress in status, so a pass can
//! stop at the first step that is still in flight and pick up there next time.

use jop_adapters::{JenkinsClient, PodExecutor, StatusStore};
use jop_core::{Clock, Jenkins, JenkinsSpec, Plugin};
use jop_engine::{
    add_secrets_loader, base_plugins, is_groovy, is_yaml, requirements_from_refs, validate,
    verify_dependencies, verify_installed, Applier, BackupAndRestore, BackupScheduler, EngineError,
    Groovy, RequirementSet, ScriptSource,
};
use std::collections::BTreeMap;
use tracing::info;

pub const USER_CONFIGURATION_TYPE: &str = "user-groovy";
pub const USER_CONFIGURATION_JOB: &str = "jop-user-configuration";
pub const SCRIPTS_PATH: &str = "/var/jenkins/user-configuration";
pub const SECRETS_PATH: &str = "/var/jenkins/groovy-scripts-secrets";
pub const CASC_CONFIGURATION_TYPE: &str = "user-casc";
pub const CASC_CONFIGURATION_JOB: &str = "jop-user-configuration-casc";
pub const CASC_PATH: &str = "/var/jenkins/casc";
pub const CASC_SECRETS_PATH: &str = "/var/jenkins/casc-secrets";

/// Cluster state read before a pass.
#[derive(Debug, Clone, Default)]
pub struct PassInputs {
    pub sources: Vec<ScriptSource>,
    pub secret: BTreeMap<String, String>,
    pub casc_sources: Vec<ScriptSource>,
    pub casc_secret: BTreeMap<String, String>,
    /// UID of the automation server pod, if it exists.
    pub master_pod_uid: Option<String>,
    /// The automation server pod is being deleted.
    pub master_terminating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converged,
    /// Work is in flight; come back after the requeue delay.
    Pending,
}

#[derive(Clone)]
pub struct Pass<J, S, E, C> {
    jenkins: J,
    store: S,
    backups: BackupAndRestore<J, S, E>,
    groovy: Groovy<J, S, C>,
    casc: Groovy<J, S, C>,
}

impl<J, S, E, C> Pass<J, S, E, C>
where
    J: JenkinsClient,
    S: StatusStore,
    E: PodExecutor,
    C: Clock,
{
    pub fn new(jenkins: J, store: S, executor: E, clock: C, scheduler: BackupScheduler) -> Self {
        Self {
            backups: BackupAndRestore::new(jenkins.clone(), store.clone(), executor, scheduler),
            groovy: Groovy::new(
                jenkins.clone(),
                store.clone(),
                clock.clone(),
                USER_CONFIGURATION_TYPE,
                USER_CONFIGURATION_JOB,
            ),
            casc: Groovy::new(
                jenkins.clone(),
                store.clone(),
                clock,
                CASC_CONFIGURATION_TYPE,
                CASC_CONFIGURATION_JOB,
            )
            .with_applier(Applier::Casc),
            jenkins,
            store,
        }
    }

    pub async fn run(&self, cr: &mut Jenkins, inputs: PassInputs) -> Result<Outcome, EngineError> {
        let problems = validate(&cr.spec);
        if !problems.is_empty() {
            return Err(EngineError::InvalidConfig(problems.join("; ")));
        }
        let (base, user) = requirements(&cr.spec)?;
        if !verify_dependencies(&[base.clone(), user.clone()]) {
            return Err(EngineError::InvalidConfig("plugin requirements conflict".to_string()));
        }

        if let Some(uid) = inputs.master_pod_uid.as_deref() {
            let previous = cr.status_or_default().master_pod_uid;
            if cr.status_mut().observe_master_pod(uid) {
                if previous.is_some() {
                    info!(key = %cr.key(), uid, "automation server pod replaced, resetting instance state");
                }
                *cr = self.store.update_status(cr).await?;
            }
        }

        if inputs.master_terminating {
            self.backups.backup_before_pod_deletion(cr).await?;
            return Ok(Outcome::Pending);
        }

        self.backups.ensure_backup_trigger(cr);
        self.backups.restore(cr).await?;
        self.backups.backup(cr).await?;

        let groovy = self.groovy.clone().with_secret(inputs.secret);
        groovy.configure_job(SCRIPTS_PATH, SECRETS_PATH).await?;
        if groovy.ensure(cr, &inputs.sources, is_groovy, add_secrets_loader(SECRETS_PATH)).await? {
            return Ok(Outcome::Pending);
        }

        let casc = self.casc.clone().with_secret(inputs.casc_secret);
        casc.configure_job(CASC_PATH, CASC_SECRETS_PATH).await?;
        if casc.ensure(cr, &inputs.casc_sources, is_yaml, |s| s.to_string()).await? {
            return Ok(Outcome::Pending);
        }

        let required: Vec<Plugin> = base.into_keys().chain(user.into_keys()).collect();
        let installed = self.jenkins.get_plugins().await?;
        if !verify_installed(&required, &installed) {
            return Ok(Outcome::Pending);
        }
        Ok(Outcome::Converged)
    }
}

/// Operator and user plugin requirement sets. The built-in base set applies
/// when the resource does not pin its own.
fn requirements(spec: &JenkinsSpec) -> Result<(RequirementSet, RequirementSet), EngineError> {
    let invalid = |e: jop_core::PluginParseError| EngineError::InvalidConfig(e.to_string());
    let base = match spec.master.base_plugins.as_slice() {
        [] => base_plugins(),
        refs => requirements_from_refs(refs).map_err(invalid)?,
    };
    let user = requirements_from_refs(&spec.master.plugins).map_err(invalid)?;
    Ok((base, user))
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
