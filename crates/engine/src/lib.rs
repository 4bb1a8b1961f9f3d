// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jop-engine: convergence engine for the Jenkins operator
//!
//! Every component keeps its progress in the `Jenkins` status and can be
//! re-invoked at any point after a crash.

pub mod backup;
pub mod error;
pub mod groovy;
pub mod jobs;
pub mod plugins;

pub use backup::{validate, BackupAndRestore, BackupScheduler};
pub use error::EngineError;
pub use groovy::{
    add_secrets_loader, calculate_hash, is_groovy, is_yaml, Applier, Groovy, ScriptSource,
};
pub use jobs::{Jobs, BUILD_RETRIES};
pub use plugins::{
    base_plugins, requirements_from_refs, verify_dependencies, verify_installed, RequirementSet,
};
