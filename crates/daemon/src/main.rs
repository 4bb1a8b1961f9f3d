// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jopd: Jenkins operator daemon

use anyhow::Context as _;
use jop_daemon::{lifecycle, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jopd starting");

    let client = kube::Client::try_default().await.context("failed to create kube client")?;
    lifecycle::run(client).await
}
