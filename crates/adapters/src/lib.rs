// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Collaborator adapters: automation server client, CR store, pod exec

pub mod exec;
pub mod jenkins;
pub mod store;

pub use exec::{ExecError, ExecOutput, KubePodExecutor, PodExecutor};
pub use jenkins::{
    Credentials, HttpJenkinsClient, InstalledPlugin, JenkinsBuild, JenkinsClient, JenkinsError,
};
pub use store::{KubeStatusStore, StatusStore, StoreError};

#[cfg(any(test, feature = "test-support"))]
pub use exec::{ExecCall, FakePodExecutor};
#[cfg(any(test, feature = "test-support"))]
pub use jenkins::{FakeJenkinsClient, JenkinsCall};
#[cfg(any(test, feature = "test-support"))]
pub use store::FakeStatusStore;
