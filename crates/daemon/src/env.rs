// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Namespace to watch. Unset or empty watches every namespace.
pub fn namespace() -> Option<String> {
    std::env::var("JOP_NAMESPACE").ok().filter(|s| !s.is_empty())
}

/// Log filter directives (default `info`).
pub fn log_filter() -> String {
    std::env::var("JOP_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Directory for daily-rotated log files. Logs go to stderr when unset.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("JOP_LOG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Fixed delay between reconcile passes (default 10s).
pub fn requeue_delay() -> Duration {
    std::env::var("JOP_REQUEUE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(10))
}

/// Overrides the per-resource service URL, e.g. when running outside the cluster.
pub fn jenkins_url() -> Option<String> {
    std::env::var("JOP_JENKINS_URL").ok().filter(|s| !s.is_empty())
}

/// Timeout for each automation server request (default 30s).
pub fn jenkins_timeout() -> Duration {
    std::env::var("JOP_JENKINS_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
