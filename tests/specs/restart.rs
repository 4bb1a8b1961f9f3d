// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build submissions survive operator restarts.

use crate::prelude::*;

const JOB: &str = "seed";

#[tokio::test]
async fn in_flight_build_is_adopted_after_restart() {
    let world = World::new(test_support::jenkins("example"));
    let params = BTreeMap::new();

    let first = world.start_operator();
    let mut cr = first.read().await;
    assert!(!first.jobs.ensure_build_job(&mut cr, JOB, "h1", &params, false).await.unwrap());
    drop(first);

    // New process, same status: polls the recorded build instead of submitting again
    let second = world.start_operator();
    let mut cr = second.read().await;
    assert!(!second.jobs.ensure_build_job(&mut cr, JOB, "h1", &params, false).await.unwrap());
    world.jenkins.finish_last_build(JOB, "SUCCESS");

    let third = world.start_operator();
    let mut cr = third.read().await;
    assert!(third.jobs.ensure_build_job(&mut cr, JOB, "h1", &params, false).await.unwrap());

    assert_eq!(world.jenkins.submissions(JOB).len(), 1);
    assert!(world.status().builds.is_empty());
}

#[tokio::test]
async fn retry_budget_is_shared_across_restarts() {
    let world = World::new(test_support::jenkins("example"));
    let params = BTreeMap::new();

    // Each failure is observed and retried by a different process
    let mut last_err = None;
    for _ in 0..20 {
        world.jenkins.finish_last_build(JOB, "FAILURE");
        let operator = world.start_operator();
        let mut cr = operator.read().await;
        match operator.jobs.ensure_build_job(&mut cr, JOB, "h1", &params, false).await {
            Err(e) if e.is_terminal() => {
                last_err = Some(e);
                break;
            }
            _ => {}
        }
    }

    assert!(matches!(last_err, Some(EngineError::UnrecoverableBuildFailed { retries, .. }) if retries == BUILD_RETRIES));
    assert_eq!(world.jenkins.submissions(JOB).len(), 1 + BUILD_RETRIES as usize);
}

#[tokio::test]
async fn changed_hash_starts_a_new_build_beside_the_old_one() {
    let world = World::new(test_support::jenkins("example"));
    let operator = world.start_operator();
    let params = BTreeMap::new();

    let mut cr = operator.read().await;
    operator.jobs.ensure_build_job(&mut cr, JOB, "h1", &params, false).await.unwrap();
    operator.jobs.ensure_build_job(&mut cr, JOB, "h2", &params, false).await.unwrap();

    world.jenkins.set_build_result(JOB, 2, "SUCCESS");
    assert!(operator.jobs.ensure_build_job(&mut cr, JOB, "h2", &params, false).await.unwrap());

    let remaining: Vec<_> = world.status().builds.into_iter().map(|b| b.hash).collect();
    assert_eq!(remaining, vec!["h1"]);
}
