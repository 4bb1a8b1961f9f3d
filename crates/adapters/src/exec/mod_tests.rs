// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn fake_records_calls() {
    let exec = FakePodExecutor::new();
    let output =
        exec.exec("default", "jenkins-example", "backup", &command(&["backup.sh", "1"])).await;
    assert_eq!(output.unwrap(), ExecOutput::default());
    assert_eq!(
        exec.calls(),
        vec![ExecCall {
            namespace: "default".into(),
            pod: "jenkins-example".into(),
            container: "backup".into(),
            command: command(&["backup.sh", "1"]),
        }]
    );
}

#[tokio::test]
async fn fake_failure_applies_once() {
    let exec = FakePodExecutor::new();
    exec.fail_next("disk full");
    let err = exec.exec("ns", "pod", "c", &[]).await.unwrap_err();
    assert!(matches!(err, ExecError::Failed { ref stderr, .. } if stderr == "disk full"));
    assert!(exec.exec("ns", "pod", "c", &[]).await.is_ok());
    assert_eq!(exec.calls().len(), 2);
}

#[test]
fn failed_error_message() {
    let err = ExecError::Failed { status: "Failure".into(), stderr: "boom".into() };
    assert_eq!(err.to_string(), "command failed (Failure): boom");
}
