// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Jenkins` custom resource.
//!
//! The status subresource is the operator's only durable memory: build
//! records, applied script records, and the backup counters all live here.

use crate::build::Build;
use crate::key::ResourceKey;
use crate::script::AppliedGroovyScript;
use k8s_openapi::api::core::v1::ExecAction;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(group = "jenkins.io", version = "v1alpha2", kind = "Jenkins", namespaced)]
#[kube(status = "JenkinsStatus", shortname = "jenkins")]
#[kube(
    printcolumn = r#"{"name":"LastBackup", "type":"integer", "jsonPath":".status.lastBackup"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsSpec {
    #[serde(default)]
    pub master: JenkinsMaster,
    #[serde(default)]
    pub backup: Backup,
    #[serde(default)]
    pub restore: Restore,
    #[serde(default)]
    pub groovy_scripts: Customization,
    #[serde(default)]
    pub configuration_as_code: Customization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsMaster {
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Operator-mandated plugins; defaults apply when empty
    #[serde(default)]
    pub base_plugins: Vec<PluginRef>,
    #[serde(default)]
    pub plugins: Vec<PluginRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PluginRef {
    pub name: String,
    pub version: String,
}

/// Remote command run in a sidecar container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecAction>,
}

impl Handler {
    /// Configured command, if any.
    pub fn command(&self) -> Option<&[String]> {
        self.exec.as_ref()?.command.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Sidecar container that runs the backup command
    #[serde(default)]
    pub container_name: String,
    #[serde(default)]
    pub action: Handler,
    /// Seconds between scheduled backups; 0 disables the trigger
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub make_backup_before_pod_deletion: bool,
}

impl Backup {
    pub fn is_configured(&self) -> bool {
        !self.container_name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restore {
    #[serde(default)]
    pub container_name: String,
    #[serde(default)]
    pub action: Handler,
    /// Pins the backup number restored next; cleared after use
    #[serde(default)]
    pub recovery_once: u64,
}

impl Restore {
    pub fn is_configured(&self) -> bool {
        !self.container_name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SecretRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigMapRef {
    pub name: String,
}

/// User-supplied scripts: config maps holding script bodies plus an optional secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Customization {
    #[serde(default)]
    pub secret: SecretRef,
    #[serde(default)]
    pub configurations: Vec<ConfigMapRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsStatus {
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default)]
    pub applied_groovy_scripts: Vec<AppliedGroovyScript>,
    /// Last completed backup number
    #[serde(default)]
    pub last_backup: u64,
    /// Next backup number to attempt; never below `last_backup`
    #[serde(default)]
    pub pending_backup: u64,
    /// Backup currently restored into the live instance, 0 if none
    #[serde(default)]
    pub restored_backup: u64,
    #[serde(default)]
    pub backup_done_before_pod_deletion: bool,
    /// UID of the automation server pod the rest of the status describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_pod_uid: Option<String>,
}

impl JenkinsStatus {
    /// Adopt the UID of the live automation server pod.
    ///
    /// A different pod means a fresh instance: builds and applied scripts are
    /// forgotten, the last backup becomes the one to restore and the final
    /// backup may run again. Returns whether anything changed.
    pub fn observe_master_pod(&mut self, uid: &str) -> bool {
        match self.master_pod_uid.as_deref() {
            Some(current) if current == uid => return false,
            Some(_) => {
                self.builds.clear();
                self.applied_groovy_scripts.clear();
                self.pending_backup = self.last_backup;
                self.restored_backup = 0;
                self.backup_done_before_pod_deletion = false;
            }
            None => {}
        }
        self.master_pod_uid = Some(uid.to_string());
        true
    }
}

impl Jenkins {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace().unwrap_or_default(), self.name_any())
    }

    /// Name of the pod running the automation server.
    pub fn master_pod_name(&self) -> String {
        format!("jenkins-{}", self.name_any())
    }

    /// Status, created empty on first access.
    pub fn status_mut(&mut self) -> &mut JenkinsStatus {
        self.status.get_or_insert_with(JenkinsStatus::default)
    }

    pub fn status_or_default(&self) -> JenkinsStatus {
        self.status.clone().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "jenkins_tests.rs"]
mod tests;
