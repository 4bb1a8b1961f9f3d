// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    not_found = { JenkinsError::NotFound("/job/x".into()), true },
    status    = { JenkinsError::Status { code: 500, body: String::new() }, false },
    transport = { JenkinsError::Transport("reset".into()), false },
)]
fn not_found_is_typed(err: JenkinsError, expected: bool) {
    assert_eq!(err.is_not_found(), expected);
}

#[yare::parameterized(
    usable   = { true,  true,  false, true },
    inactive = { false, true,  false, false },
    disabled = { true,  false, false, false },
    deleted  = { true,  true,  true,  false },
)]
fn installed_plugin_usable(active: bool, enabled: bool, deleted: bool, usable: bool) {
    let plugin = InstalledPlugin {
        short_name: "git".into(),
        version: "1.0".into(),
        active,
        enabled,
        deleted,
    };
    assert_eq!(plugin.is_usable(), usable);
}

#[tokio::test]
async fn fake_builds_run_until_finished() {
    let client = FakeJenkinsClient::new();
    let number = client.build_job("seed", &BTreeMap::new()).await.unwrap();
    assert_eq!(number, 1);

    let build = client.get_build("seed", 1).await.unwrap();
    assert!(build.building);
    assert_eq!(build.result, None);

    client.finish_last_build("seed", "SUCCESS");
    let build = client.get_build("seed", 1).await.unwrap();
    assert_eq!(build.result.as_deref(), Some("SUCCESS"));
    assert_eq!(client.build_job("seed", &BTreeMap::new()).await.unwrap(), 2);
}

#[tokio::test]
async fn fake_hidden_builds_are_not_found() {
    let client = FakeJenkinsClient::new();
    client.hide_new_builds(true);
    client.build_job("seed", &BTreeMap::new()).await.unwrap();
    assert!(client.get_build("seed", 1).await.unwrap_err().is_not_found());

    client.reveal_build("seed", 1);
    assert!(client.get_build("seed", 1).await.is_ok());
}

#[tokio::test]
async fn fake_stop_aborts_build() {
    let client = FakeJenkinsClient::new();
    client.build_job("seed", &BTreeMap::new()).await.unwrap();
    client.stop_build("seed", 1).await.unwrap();
    let build = client.get_build("seed", 1).await.unwrap();
    assert_eq!(build.result.as_deref(), Some("ABORTED"));
}

#[tokio::test]
async fn fake_script_failure_is_consumed_once() {
    let client = FakeJenkinsClient::new();
    client.fail_next_script("boom");
    assert!(matches!(
        client.execute_script("a").await,
        Err(JenkinsError::ScriptFailed { ref logs }) if logs == "boom"
    ));
    assert!(client.execute_script("b").await.is_ok());
    assert_eq!(client.scripts(), vec!["a".to_string(), "b".to_string()]);
}
