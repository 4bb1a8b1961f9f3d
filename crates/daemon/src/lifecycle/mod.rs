// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator lifecycle: controller wiring and shutdown.

mod pass;
mod reconcile;

pub use pass::{Outcome, Pass, PassInputs, USER_CONFIGURATION_JOB, USER_CONFIGURATION_TYPE};
pub use reconcile::{error_policy, reconcile, Context, ReconcileError};

use crate::env;
use futures_util::StreamExt;
use jop_core::Jenkins;
use kube::api::Api;
use kube::runtime::{watcher, Controller};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller until SIGINT/SIGTERM, then stop every backup trigger.
pub async fn run(client: Client) -> anyhow::Result<()> {
    let ctx = Arc::new(Context::new(client.clone()));
    let namespace = env::namespace();
    let jenkinses: Api<Jenkins> = match &namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    info!(namespace = namespace.as_deref().unwrap_or("*"), "starting controller");
    Controller::new(jenkinses, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::clone(&ctx))
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(resource = %object, "reconciled"),
                Err(e) => warn!(error = %e, "controller error"),
            }
        })
        .await;

    ctx.scheduler.stop_all();
    info!("controller stopped");
    Ok(())
}
