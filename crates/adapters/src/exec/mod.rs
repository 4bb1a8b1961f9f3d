// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command execution inside pod containers.

mod k8s;

pub use k8s::KubePodExecutor;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from remote command execution
#[derive(Debug, Error)]
pub enum ExecError {
    /// Could not open or read the exec stream
    #[error("exec stream error: {0}")]
    Stream(String),
    /// The command ran and exited unsuccessfully
    #[error("command failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
}

/// Captured output of a completed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Adapter for running a command in a pod container
#[async_trait]
pub trait PodExecutor: Clone + Send + Sync + 'static {
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, ExecError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExecError, ExecOutput, PodExecutor};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Recorded exec call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ExecCall {
        pub namespace: String,
        pub pod: String,
        pub container: String,
        pub command: Vec<String>,
    }

    #[derive(Default)]
    struct FakeExecState {
        calls: Vec<ExecCall>,
        failures: VecDeque<String>,
    }

    /// Fake executor; commands succeed with empty output unless a failure is queued.
    #[derive(Clone, Default)]
    pub struct FakePodExecutor {
        inner: Arc<Mutex<FakeExecState>>,
    }

    impl FakePodExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ExecCall> {
            self.inner.lock().calls.clone()
        }

        /// The next command fails with this stderr.
        pub fn fail_next(&self, stderr: &str) {
            self.inner.lock().failures.push_back(stderr.to_string());
        }
    }

    #[async_trait]
    impl PodExecutor for FakePodExecutor {
        async fn exec(
            &self,
            namespace: &str,
            pod: &str,
            container: &str,
            command: &[String],
        ) -> Result<ExecOutput, ExecError> {
            let mut state = self.inner.lock();
            state.calls.push(ExecCall {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                container: container.to_string(),
                command: command.to_vec(),
            });
            match state.failures.pop_front() {
                Some(stderr) => Err(ExecError::Failed { status: "Failure".to_string(), stderr }),
                None => Ok(ExecOutput::default()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakePodExecutor};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
