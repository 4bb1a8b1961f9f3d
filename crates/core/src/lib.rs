// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jop-core: data model for the Jenkins operator convergence engine

pub mod macros;

pub mod build;
pub mod clock;
pub mod jenkins;
pub mod key;
pub mod plugin;
pub mod script;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(any(test, feature = "test-support"))]
pub use build::BuildBuilder;
pub use build::{Build, BuildStatus};
pub use clock::{Clock, FakeClock, SystemClock};
pub use jenkins::{
    Backup, ConfigMapRef, Container, Customization, Handler, Jenkins, JenkinsMaster, JenkinsSpec,
    JenkinsStatus, PluginRef, Restore, SecretRef,
};
pub use key::ResourceKey;
pub use plugin::{Plugin, PluginParseError};
pub use script::AppliedGroovyScript;
