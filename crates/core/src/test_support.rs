// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::jenkins::{
    Backup, ConfigMapRef, Container, Handler, Jenkins, JenkinsSpec, JenkinsStatus, Restore,
};
use k8s_openapi::api::core::v1::ExecAction;

pub const NAMESPACE: &str = "default";
pub const MASTER_CONTAINER: &str = "jenkins-master";
pub const BACKUP_CONTAINER: &str = "backup";

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core types.
pub mod strategies {
    use crate::build::BuildStatus;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    pub fn arb_build_status() -> impl Strategy<Value = BuildStatus> {
        prop_oneof![
            Just(BuildStatus::Running),
            Just(BuildStatus::Success),
            Just(BuildStatus::Unstable),
            Just(BuildStatus::NotBuilt),
            Just(BuildStatus::Failure),
            Just(BuildStatus::Aborted),
            Just(BuildStatus::Expired),
        ]
    }

    /// Named script bodies, keyed like a config map.
    pub fn arb_scripts() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map("[a-z]{1,8}\\.groovy", "[ -~]{0,40}", 1..6)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// Exec action for `command`.
pub fn handler(command: &[&str]) -> Handler {
    Handler {
        exec: Some(ExecAction { command: Some(command.iter().map(|s| s.to_string()).collect()) }),
    }
}

/// A bare `Jenkins` resource in the default namespace with an empty status.
pub fn jenkins(name: &str) -> Jenkins {
    let mut jenkins = Jenkins::new(name, JenkinsSpec::default());
    jenkins.metadata.namespace = Some(NAMESPACE.to_string());
    jenkins.spec.master.containers = vec![Container { name: MASTER_CONTAINER.to_string(), image: None }];
    jenkins.status = Some(JenkinsStatus::default());
    jenkins
}

/// A `Jenkins` resource with a backup sidecar, backup and restore commands,
/// and the given backup interval in seconds.
pub fn jenkins_with_backup(name: &str, interval: u64) -> Jenkins {
    let mut jenkins = jenkins(name);
    jenkins.spec.master.containers.push(Container { name: BACKUP_CONTAINER.to_string(), image: None });
    jenkins.spec.backup = Backup {
        container_name: BACKUP_CONTAINER.to_string(),
        action: handler(&["/home/user/bin/backup.sh"]),
        interval,
        make_backup_before_pod_deletion: true,
    };
    jenkins.spec.restore = Restore {
        container_name: BACKUP_CONTAINER.to_string(),
        action: handler(&["/home/user/bin/restore.sh"]),
        recovery_once: 0,
    };
    jenkins
}

/// A `Jenkins` resource referencing the given groovy script config maps.
pub fn jenkins_with_scripts(name: &str, config_maps: &[&str]) -> Jenkins {
    let mut jenkins = jenkins(name);
    jenkins.spec.groovy_scripts.configurations =
        config_maps.iter().map(|n| ConfigMapRef { name: n.to_string() }).collect();
    jenkins
}
