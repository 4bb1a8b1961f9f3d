// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support;

#[test]
fn key_and_master_pod_name() {
    let jenkins = test_support::jenkins("example");
    assert_eq!(jenkins.key().to_string(), "default/example");
    assert_eq!(jenkins.master_pod_name(), "jenkins-example");
}

#[test]
fn status_defaults_when_fields_missing() {
    let status: JenkinsStatus = serde_json::from_str(r#"{"lastBackup": 3}"#).unwrap();
    assert_eq!(status.last_backup, 3);
    assert_eq!(status.pending_backup, 0);
    assert!(status.builds.is_empty());
    assert!(!status.backup_done_before_pod_deletion);
}

#[test]
fn status_serializes_camel_case() {
    let status = JenkinsStatus { pending_backup: 2, ..Default::default() };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["pendingBackup"], 2);
    assert_eq!(json["appliedGroovyScripts"], serde_json::json!([]));
    assert_eq!(json["backupDoneBeforePodDeletion"], false);
}

#[test]
fn status_mut_creates_missing_status() {
    let mut jenkins = test_support::jenkins("example");
    jenkins.status = None;
    jenkins.status_mut().last_backup = 4;
    assert_eq!(jenkins.status_or_default().last_backup, 4);
}

#[test]
fn first_observed_pod_only_records_uid() {
    let mut status = JenkinsStatus {
        last_backup: 3,
        pending_backup: 4,
        restored_backup: 3,
        builds: vec![Build::new("job", "h1")],
        ..Default::default()
    };
    assert!(status.observe_master_pod("a"));
    assert_eq!(status.master_pod_uid.as_deref(), Some("a"));
    assert_eq!((status.pending_backup, status.restored_backup), (4, 3));
    assert_eq!(status.builds.len(), 1);

    assert!(!status.observe_master_pod("a"));
}

#[test]
fn new_pod_resets_instance_state() {
    let mut status = JenkinsStatus {
        last_backup: 3,
        pending_backup: 4,
        restored_backup: 2,
        backup_done_before_pod_deletion: true,
        builds: vec![Build::new("job", "h1")],
        applied_groovy_scripts: vec![AppliedGroovyScript::new("user-groovy", "scripts", "a.groovy", "h")],
        master_pod_uid: Some("a".to_string()),
    };
    assert!(status.observe_master_pod("b"));

    assert_eq!(status.master_pod_uid.as_deref(), Some("b"));
    assert_eq!(status.last_backup, 3);
    assert_eq!(status.pending_backup, 3);
    assert_eq!(status.restored_backup, 0);
    assert!(!status.backup_done_before_pod_deletion);
    assert!(status.builds.is_empty());
    assert!(status.applied_groovy_scripts.is_empty());
}

#[test]
fn pod_uid_is_omitted_until_observed() {
    let json = serde_json::to_value(JenkinsStatus::default()).unwrap();
    assert!(json.get("masterPodUid").is_none());

    let status: JenkinsStatus = serde_json::from_str(r#"{"masterPodUid": "a"}"#).unwrap();
    assert_eq!(status.master_pod_uid.as_deref(), Some("a"));
}

#[test]
fn handler_command() {
    assert_eq!(Handler::default().command(), None);
    let handler = test_support::handler(&["backup.sh", "-v"]);
    assert_eq!(handler.command(), Some(&["backup.sh".to_string(), "-v".to_string()][..]));
    let empty = test_support::handler(&[]);
    assert_eq!(empty.command(), None);
}

#[test]
fn spec_parses_backup_section() {
    let spec: JenkinsSpec = serde_json::from_value(serde_json::json!({
        "backup": {
            "containerName": "backup",
            "action": {"exec": {"command": ["/bin/backup.sh"]}},
            "interval": 30,
            "makeBackupBeforePodDeletion": true
        },
        "restore": {"containerName": "backup", "recoveryOnce": 7}
    }))
    .unwrap();
    assert!(spec.backup.is_configured());
    assert_eq!(spec.backup.interval, 30);
    assert!(spec.backup.make_backup_before_pod_deletion);
    assert_eq!(spec.restore.recovery_once, 7);
    assert_eq!(spec.restore.action.command(), None);
}
