// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use jop_adapters::{ExecError, JenkinsError, StoreError};
use jop_core::BuildStatus;
use thiserror::Error;

/// Errors returned by convergence operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The build reached a failing terminal state; retried on the next pass
    #[error("build {job}#{number} for hash {hash} finished {status}")]
    BuildFailed { job: String, hash: String, number: i64, status: BuildStatus },
    /// Retry budget exhausted; terminal until the hash changes
    #[error("build of {job} for hash {hash} failed after {retries} retries")]
    UnrecoverableBuildFailed { job: String, hash: String, retries: u32 },
    /// The server reported a result this operator does not know
    #[error("build {job}#{number} reported unexpected result '{result}'")]
    UnexpectedBuildResult { job: String, number: i64, result: String },
    #[error("abort of build {job}#{number} could not be confirmed")]
    AbortFailed { job: String, number: i64 },
    #[error("jenkins: {0}")]
    Jenkins(#[from] JenkinsError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("exec: {0}")]
    Exec(#[from] ExecError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Optimistic concurrency rejection; re-read and retry the whole operation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_conflict())
    }

    pub fn is_retryable_build_failure(&self) -> bool {
        matches!(self, EngineError::BuildFailed { .. })
    }

    /// Outcomes where the component gave up until its inputs change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineError::UnrecoverableBuildFailed { .. } | EngineError::AbortFailed { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
