// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted record of one externally triggered build.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked build.
///
/// `Running` and `Expired` are operator-side states; the others mirror the
/// result reported by the automation server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    #[default]
    Running,
    Success,
    Unstable,
    /// A problem in an earlier stage prevented later stages from building
    #[serde(rename = "not_build")]
    NotBuilt,
    Failure,
    Aborted,
    /// Operator decided the build ran too long and must be stopped
    Expired,
}

impl BuildStatus {
    /// Map a build result string reported by the automation server.
    ///
    /// Results are upper-case (`SUCCESS`, `NOT_BUILT`, ...); matching is
    /// case-insensitive. Returns `None` for unknown results.
    pub fn from_result(result: &str) -> Option<Self> {
        match result.to_ascii_lowercase().as_str() {
            "success" => Some(Self::Success),
            "unstable" => Some(Self::Unstable),
            "not_built" | "not_build" => Some(Self::NotBuilt),
            "failure" => Some(Self::Failure),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Terminal, non-successful states that consume a retry.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Unstable | Self::NotBuilt | Self::Failure | Self::Aborted)
    }
}

crate::simple_display! {
    BuildStatus {
        Running => "running",
        Success => "success",
        Unstable => "unstable",
        NotBuilt => "not_build",
        Failure => "failure",
        Aborted => "aborted",
        Expired => "expired",
    }
}

/// A build of `job_name` correlated with the content `hash` that caused it.
///
/// Unique by `(job_name, hash)` within the status build list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub job_name: String,
    pub hash: String,
    /// Build number on the automation server, captured before submission
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub status: BuildStatus,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<Time>,
}

impl Build {
    pub fn new(job_name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self { job_name: job_name.into(), hash: hash.into(), ..Default::default() }
    }

    pub fn matches(&self, job_name: &str, hash: &str) -> bool {
        self.job_name == job_name && self.hash == hash
    }
}

crate::builder! {
    pub struct BuildBuilder => Build {
        into {
            job_name: String = "job",
            hash: String = "hash",
        }
        set {
            number: i64 = 1,
            status: BuildStatus = BuildStatus::Running,
            retries: u32 = 0,
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
