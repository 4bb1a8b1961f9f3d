// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automation server (Jenkins) client seam.

mod client;
mod http;

pub use client::{Credentials, HttpJenkinsClient};

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from automation server operations
#[derive(Debug, Error)]
pub enum JenkinsError {
    /// The job or build does not exist (yet)
    #[error("not found: {0}")]
    NotFound(String),
    #[error("script execution failed: {logs}")]
    ScriptFailed { logs: String },
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl JenkinsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JenkinsError::NotFound(_))
    }
}

/// A build as reported by the automation server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JenkinsBuild {
    pub number: i64,
    /// `None` while the build is still running
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
}

/// A plugin as installed on the automation server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub short_name: String,
    pub version: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl InstalledPlugin {
    pub fn is_usable(&self) -> bool {
        self.active && self.enabled && !self.deleted
    }
}

/// Adapter for the automation server's remote API
#[async_trait]
pub trait JenkinsClient: Clone + Send + Sync + 'static {
    /// Create the job, or replace its configuration. Returns true if created.
    async fn create_or_update_job(&self, config_xml: &str, name: &str)
        -> Result<bool, JenkinsError>;

    /// Submit a parameterized build and return the build number it will get.
    async fn build_job(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<i64, JenkinsError>;

    /// Fetch one build. Returns `NotFound` until the build is visible.
    async fn get_build(&self, name: &str, number: i64) -> Result<JenkinsBuild, JenkinsError>;

    async fn console_output(&self, name: &str, number: i64) -> Result<String, JenkinsError>;

    async fn stop_build(&self, name: &str, number: i64) -> Result<(), JenkinsError>;

    /// Run a script on the script console and return its output.
    ///
    /// Fails with `ScriptFailed` unless the script ran to completion.
    async fn execute_script(&self, script: &str) -> Result<String, JenkinsError>;

    async fn get_plugins(&self) -> Result<Vec<InstalledPlugin>, JenkinsError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJenkinsClient, JenkinsCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
