// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script batches applied exactly once per content hash.

use crate::prelude::*;

fn scripts() -> Vec<ScriptSource> {
    vec![source("scripts", &[("1-users.groovy", "println 'users'"), ("README.md", "docs")])]
}

async fn ensure(operator: &Operator, sources: &[ScriptSource]) -> Result<bool, EngineError> {
    let mut cr = operator.read().await;
    let loader = add_secrets_loader("/var/jenkins/groovy-scripts-secrets");
    operator.groovy.ensure(&mut cr, sources, is_groovy, loader).await
}

#[tokio::test]
async fn batch_runs_once_across_restarts() {
    let world = World::new(test_support::jenkins_with_scripts("example", &["scripts"]));

    assert!(ensure(&world.start_operator(), &scripts()).await.unwrap());
    assert!(ensure(&world.start_operator(), &scripts()).await.unwrap());
    world.jenkins.finish_last_build(CONFIG_JOB, "SUCCESS");

    assert!(!ensure(&world.start_operator(), &scripts()).await.unwrap());
    assert!(!ensure(&world.start_operator(), &scripts()).await.unwrap());

    assert_eq!(world.jenkins.submissions(CONFIG_JOB).len(), 1);
    let status = world.status();
    assert_eq!(status.applied_groovy_scripts.len(), 1);
    assert!(status.builds.is_empty());
}

#[tokio::test]
async fn concurrent_status_write_forces_a_reread() {
    let world = World::new(test_support::jenkins_with_scripts("example", &["scripts"]));
    let operator = world.start_operator();
    assert!(ensure(&operator, &scripts()).await.unwrap());
    world.jenkins.finish_last_build(CONFIG_JOB, "SUCCESS");

    // A timer tick lands between the read and the write
    let mut stale = operator.read().await;
    world.store.modify_status(&world.key, |s| s.pending_backup += 1);
    let loader = add_secrets_loader("/secrets");
    let err = operator.groovy.ensure(&mut stale, &scripts(), is_groovy, loader).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(world.status().applied_groovy_scripts.is_empty());

    // The requeued pass sees both writers' changes
    assert!(!ensure(&operator, &scripts()).await.unwrap());
    let status = world.status();
    assert_eq!(status.pending_backup, 1);
    assert_eq!(status.applied_groovy_scripts.len(), 1);
    assert_eq!(world.jenkins.submissions(CONFIG_JOB).len(), 1);
}

#[tokio::test]
async fn edited_script_is_applied_again() {
    let world = World::new(test_support::jenkins_with_scripts("example", &["scripts"]));
    let operator = world.start_operator();
    ensure(&operator, &scripts()).await.unwrap();
    world.jenkins.finish_last_build(CONFIG_JOB, "SUCCESS");
    ensure(&operator, &scripts()).await.unwrap();

    let edited = vec![source("scripts", &[("1-users.groovy", "println 'admins'")])];
    assert!(ensure(&operator, &edited).await.unwrap());
    world.jenkins.finish_last_build(CONFIG_JOB, "SUCCESS");
    assert!(!ensure(&operator, &edited).await.unwrap());

    assert_eq!(world.jenkins.submissions(CONFIG_JOB).len(), 2);
    assert_eq!(world.status().applied_groovy_scripts.len(), 1);
}
