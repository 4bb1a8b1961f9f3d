// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jop_adapters::StoreError;
use jop_core::{test_support, BuildStatus, ResourceKey};
use k8s_openapi::ByteString;

const DELAY: Duration = Duration::from_secs(10);

fn secret(entries: &[(&str, &str)]) -> Secret {
    Secret {
        data: Some(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Secret::default()
    }
}

#[test]
fn pending_and_converged_wait_the_fixed_delay() {
    assert_eq!(requeue_delay(Ok(Outcome::Pending), DELAY).unwrap(), DELAY);
    assert_eq!(requeue_delay(Ok(Outcome::Converged), DELAY).unwrap(), DELAY);
}

#[test]
fn conflict_requeues_after_a_short_pause() {
    let err = EngineError::Store(StoreError::Conflict(ResourceKey::new("default", "example")));
    let delay = requeue_delay(Err(err), DELAY).unwrap();
    assert_eq!(delay, CONFLICT_DELAY);
    assert!(delay > Duration::ZERO);
    assert!(delay < DELAY);
}

#[yare::parameterized(
    build_failed = { EngineError::BuildFailed { job: "j".into(), hash: "h".into(), number: 1, status: BuildStatus::Failure } },
    unrecoverable = { EngineError::UnrecoverableBuildFailed { job: "j".into(), hash: "h".into(), retries: 3 } },
    abort_failed = { EngineError::AbortFailed { job: "j".into(), number: 1 } },
)]
fn build_outcomes_wait_the_fixed_delay(err: EngineError) {
    assert_eq!(requeue_delay(Err(err), DELAY).unwrap(), DELAY);
}

#[test]
fn other_errors_go_to_the_error_policy() {
    let err = EngineError::InvalidConfig("bad".into());
    assert!(matches!(requeue_delay(Err(err), DELAY), Err(EngineError::InvalidConfig(_))));
}

#[test]
fn unexpected_build_result_goes_to_the_error_policy() {
    let err = EngineError::UnexpectedBuildResult { job: "j".into(), number: 4, result: "PAUSED".into() };
    assert!(matches!(
        requeue_delay(Err(err), DELAY),
        Err(EngineError::UnexpectedBuildResult { number: 4, .. })
    ));
}

#[test]
fn names_follow_the_resource() {
    let cr = test_support::jenkins("example");
    assert_eq!(credentials_secret_name(&cr), "jenkins-operator-credentials-example");
    assert_eq!(service_url(&cr), "http://jenkins-operator-http-example.default.svc.cluster.local:8080");
}

#[test]
fn credentials_are_read_from_the_secret() {
    let credentials =
        credentials_from("creds", &secret(&[("user", "operator"), ("token", "t0k3n")])).unwrap();
    assert_eq!(credentials.user, "operator");
    assert_eq!(credentials.token, "t0k3n");
}

#[yare::parameterized(
    missing_token = { &[("user", "operator")] },
    empty_user    = { &[("user", ""), ("token", "t0k3n")] },
    no_data       = { &[] },
)]
fn incomplete_credentials_are_rejected(entries: &[(&str, &str)]) {
    let err = credentials_from("creds", &secret(entries)).unwrap_err();
    assert!(matches!(err, ReconcileError::Credentials { ref secret, .. } if secret == "creds"));
}

#[test]
fn secret_values_are_decoded() {
    let data = secret_data(&secret(&[("token", "s3cret")]));
    assert_eq!(data, BTreeMap::from([("token".to_string(), "s3cret".to_string())]));
    assert!(secret_data(&Secret::default()).is_empty());
}
