// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller callbacks: gather inputs from the cluster, run a pass, and
//! turn its outcome into a requeue.

use super::pass::{Outcome, Pass, PassInputs};
use crate::env;
use jop_adapters::{Credentials, HttpJenkinsClient, JenkinsError, KubePodExecutor, KubeStatusStore};
use jop_core::{Customization, Jenkins, SystemClock};
use jop_engine::{BackupScheduler, EngineError, ScriptSource};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const CREDENTIALS_USER_KEY: &str = "user";
const CREDENTIALS_TOKEN_KEY: &str = "token";
const HTTP_PORT: u16 = 8080;
/// Requeue after a write conflict; gives the watch cache time to catch up.
pub(crate) const CONFLICT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("kubernetes: {0}")]
    Kube(#[from] kube::Error),
    #[error("jenkins client: {0}")]
    Client(#[from] JenkinsError),
    #[error("credentials secret {secret}: {reason}")]
    Credentials { secret: String, reason: String },
}

/// Shared state for every reconcile pass.
pub struct Context {
    client: Client,
    store: KubeStatusStore,
    executor: KubePodExecutor,
    pub(crate) scheduler: BackupScheduler,
    requeue_delay: Duration,
}

impl Context {
    pub fn new(client: Client) -> Self {
        Self {
            store: KubeStatusStore::new(client.clone()),
            executor: KubePodExecutor::new(client.clone()),
            scheduler: BackupScheduler::new(),
            requeue_delay: env::requeue_delay(),
            client,
        }
    }

    async fn jenkins_client(&self, cr: &Jenkins) -> Result<HttpJenkinsClient, ReconcileError> {
        let namespace = cr.namespace().unwrap_or_default();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        let name = credentials_secret_name(cr);
        let secret = secrets.get(&name).await?;
        let credentials = credentials_from(&name, &secret)?;
        let url = env::jenkins_url().unwrap_or_else(|| service_url(cr));
        Ok(HttpJenkinsClient::new(&url, &credentials, env::jenkins_timeout())?)
    }

    async fn inputs(&self, cr: &Jenkins) -> Result<PassInputs, ReconcileError> {
        let (sources, secret) = self.customization(cr, &cr.spec.groovy_scripts).await?;
        let (casc_sources, casc_secret) =
            self.customization(cr, &cr.spec.configuration_as_code).await?;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &cr.namespace().unwrap_or_default());
        let master = pods.get_opt(&cr.master_pod_name()).await?;
        let master_terminating =
            master.as_ref().is_some_and(|pod| pod.metadata.deletion_timestamp.is_some());
        let master_pod_uid = master.and_then(|pod| pod.metadata.uid);

        Ok(PassInputs {
            sources,
            secret,
            casc_sources,
            casc_secret,
            master_pod_uid,
            master_terminating,
        })
    }

    /// Config map contents and secret data referenced by one customization.
    async fn customization(
        &self,
        cr: &Jenkins,
        customization: &Customization,
    ) -> Result<(Vec<ScriptSource>, BTreeMap<String, String>), ReconcileError> {
        let namespace = cr.namespace().unwrap_or_default();
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &namespace);
        let mut sources = Vec::new();
        for reference in &customization.configurations {
            let config_map = config_maps.get(&reference.name).await?;
            sources.push(ScriptSource::new(&reference.name, config_map.data.unwrap_or_default()));
        }

        let secret = match customization.secret.name.as_str() {
            "" => BTreeMap::new(),
            name => {
                let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
                secret_data(&secrets.get(name).await?)
            }
        };
        Ok((sources, secret))
    }
}

pub async fn reconcile(cr: Arc<Jenkins>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let key = cr.key();
    if cr.metadata.deletion_timestamp.is_some() {
        info!(%key, "resource deleted, stopping backup trigger");
        ctx.scheduler.stop(&key);
        return Ok(Action::await_change());
    }

    let mut cr = Jenkins::clone(&cr);
    let jenkins = ctx.jenkins_client(&cr).await?;
    let inputs = ctx.inputs(&cr).await?;
    let pass = Pass::new(
        jenkins,
        ctx.store.clone(),
        ctx.executor.clone(),
        SystemClock,
        ctx.scheduler.clone(),
    );

    let result = pass.run(&mut cr, inputs).await;
    let delay = requeue_delay(result, ctx.requeue_delay)?;
    debug!(%key, ?delay, "pass finished");
    Ok(Action::requeue(delay))
}

pub fn error_policy(cr: Arc<Jenkins>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    warn!(key = %cr.key(), error = %err, "reconcile failed");
    Action::requeue(ctx.requeue_delay)
}

/// Map a pass result onto the delay before the next pass.
///
/// Conflicts come back after a short pause so the next read sees the newer
/// object. Build failures and give-up outcomes wait out the fixed delay;
/// anything else is an error.
pub(crate) fn requeue_delay(
    result: Result<Outcome, EngineError>,
    delay: Duration,
) -> Result<Duration, EngineError> {
    match result {
        Ok(Outcome::Converged) | Ok(Outcome::Pending) => Ok(delay),
        Err(e) if e.is_conflict() => {
            debug!(error = %e, "status changed underneath, requeueing");
            Ok(CONFLICT_DELAY)
        }
        Err(e) if e.is_retryable_build_failure() => {
            warn!(error = %e, "build failed, will retry");
            Ok(delay)
        }
        Err(e) if e.is_terminal() => {
            error!(error = %e, "giving up until the configuration changes");
            Ok(delay)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn credentials_secret_name(cr: &Jenkins) -> String {
    format!("jenkins-operator-credentials-{}", cr.name_any())
}

pub(crate) fn service_url(cr: &Jenkins) -> String {
    format!(
        "http://jenkins-operator-http-{}.{}.svc.cluster.local:{}",
        cr.name_any(),
        cr.namespace().unwrap_or_default(),
        HTTP_PORT
    )
}

pub(crate) fn secret_data(secret: &Secret) -> BTreeMap<String, String> {
    secret
        .data
        .iter()
        .flatten()
        .map(|(key, value)| (key.clone(), String::from_utf8_lossy(&value.0).into_owned()))
        .collect()
}

pub(crate) fn credentials_from(name: &str, secret: &Secret) -> Result<Credentials, ReconcileError> {
    let mut data = secret_data(secret);
    let mut take = |key: &str| {
        data.remove(key).filter(|v| !v.is_empty()).ok_or_else(|| ReconcileError::Credentials {
            secret: name.to_string(),
            reason: format!("missing '{}'", key),
        })
    };
    Ok(Credentials { user: take(CREDENTIALS_USER_KEY)?, token: take(CREDENTIALS_TOKEN_KEY)? })
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
