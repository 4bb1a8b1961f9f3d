// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic backups and restore onto a fresh instance.

use crate::prelude::*;

async fn backup_pass(operator: &Operator) {
    let mut cr = operator.read().await;
    operator.backups.ensure_backup_trigger(&cr);
    operator.backups.restore(&mut cr).await.unwrap();
    operator.backups.backup(&mut cr).await.unwrap();
}

/// Numbers passed to the given sidecar script, in call order.
fn numbers(world: &World, script: &str) -> Vec<String> {
    world
        .executor
        .calls()
        .into_iter()
        .filter(|c| c.command.first().is_some_and(|c| c.ends_with(script)))
        .filter_map(|c| c.command.last().cloned())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn timer_and_passes_take_one_backup_per_interval() {
    let world = World::new(test_support::jenkins_with_backup("example", 60));
    let operator = world.start_operator();

    // Nothing pending yet: no command
    backup_pass(&operator).await;
    assert!(world.executor.calls().is_empty());

    // Passes land just after each tick
    tokio::time::sleep(Duration::from_secs(1)).await;
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(60)).await;
        backup_pass(&operator).await;
        backup_pass(&operator).await;
    }

    assert_eq!(numbers(&world, "backup.sh"), vec!["1", "2", "3"]);
    let status = world.status();
    assert_eq!((status.last_backup, status.pending_backup, status.restored_backup), (3, 3, 1));
}

#[tokio::test(start_paused = true)]
async fn restarted_operator_restores_last_backup_on_new_instance() {
    let world = World::new(test_support::jenkins_with_backup("example", 60));
    let operator = world.start_operator();
    backup_pass(&operator).await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    backup_pass(&operator).await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    backup_pass(&operator).await;
    operator.scheduler.stop_all();
    assert_eq!(world.status().last_backup, 2);

    // The instance is recreated: nothing restored into it yet
    world.store.modify_status(&world.key, |s| s.restored_backup = 0);
    let restarted = world.start_operator();
    backup_pass(&restarted).await;

    assert_eq!(numbers(&world, "restore.sh"), vec!["2"]);
    assert!(world
        .jenkins
        .calls()
        .contains(&JenkinsCall::ExecuteScript { script: "Jenkins.instance.reload()".to_string() }));
    // Restoring 2 leaves 3 pending, taken in the same pass
    assert_eq!(numbers(&world, "backup.sh"), vec!["1", "2", "3"]);
    let status = world.status();
    assert_eq!((status.restored_backup, status.last_backup, status.pending_backup), (2, 3, 3));
    assert!(restarted.scheduler.is_running(&world.key));
}
