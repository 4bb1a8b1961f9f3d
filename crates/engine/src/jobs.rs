// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build job state machine.
//!
//! Tracks one remote build per `(job, hash)` in the `Jenkins` status so that
//! repeated, possibly interrupted, reconcile passes submit each build once:
//!
//! ```text
//! absent ──submit──▶ running ──poll──▶ success ──▶ done
//!                       │
//!                       └──▶ failed ──retry (≤ 3)──▶ running
//!                               └──budget spent──▶ unrecoverable
//! expired ──stop──▶ aborted ──▶ done
//! ```

use crate::error::EngineError;
use jop_adapters::{JenkinsClient, StatusStore};
use jop_core::{Build, BuildStatus, Clock, Jenkins};
use std::collections::BTreeMap;

/// Retries attempted before a hash is declared unrecoverable.
pub const BUILD_RETRIES: u32 = 3;

/// Drives remote builds, persisting progress in the status build list.
#[derive(Clone)]
pub struct Jobs<J, S, C> {
    jenkins: J,
    store: S,
    clock: C,
}

impl<J, S, C> Jobs<J, S, C>
where
    J: JenkinsClient,
    S: StatusStore,
    C: Clock,
{
    pub fn new(jenkins: J, store: S, clock: C) -> Self {
        Self { jenkins, store, clock }
    }

    /// Advance the build of `job` for `hash` by one step.
    ///
    /// Returns `Ok(true)` once the build is confirmed successful (or an
    /// expired build is confirmed aborted) and `Ok(false)` while the caller
    /// should come back on a later pass. `cr` is refreshed after each write.
    /// With `preserve`, the record stays in status after a terminal outcome.
    pub async fn ensure_build_job(
        &self,
        cr: &mut Jenkins,
        job: &str,
        hash: &str,
        params: &BTreeMap<String, String>,
        preserve: bool,
    ) -> Result<bool, EngineError> {
        let existing = cr.status_or_default().builds.into_iter().find(|b| b.matches(job, hash));
        let Some(build) = existing else {
            tracing::debug!(job, hash, "no build recorded, submitting");
            let mut build = Build::new(job, hash);
            build.create_time = Some(self.clock.now_time());
            self.submit(cr, build, params).await?;
            return Ok(false);
        };

        match build.status {
            BuildStatus::Running => self.ensure_running(cr, build, preserve).await,
            BuildStatus::Success => {
                if !preserve {
                    self.remove_build(cr, &build).await?;
                }
                Ok(true)
            }
            BuildStatus::Expired => self.ensure_expired(cr, build, preserve).await,
            _ => self.ensure_failed(cr, build, params, preserve).await,
        }
    }

    async fn ensure_running(
        &self,
        cr: &mut Jenkins,
        mut build: Build,
        preserve: bool,
    ) -> Result<bool, EngineError> {
        let remote = match self.jenkins.get_build(&build.job_name, build.number).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                tracing::debug!(job = %build.job_name, number = build.number, "build not visible yet");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(result) = remote.result.as_deref().filter(|r| !r.is_empty()) else {
            tracing::debug!(job = %build.job_name, number = build.number, "build still running");
            return Ok(false);
        };
        let Some(status) = BuildStatus::from_result(result) else {
            tracing::warn!(job = %build.job_name, number = build.number, result, "unexpected build result");
            return Err(EngineError::UnexpectedBuildResult {
                job: build.job_name,
                number: build.number,
                result: result.to_string(),
            });
        };

        build.status = status;
        if status == BuildStatus::Success {
            tracing::info!(job = %build.job_name, hash = %build.hash, number = build.number, "build finished successfully");
            if preserve {
                self.upsert_build(cr, build).await?;
            } else {
                self.remove_build(cr, &build).await?;
            }
            return Ok(true);
        }

        tracing::warn!(
            job = %build.job_name,
            hash = %build.hash,
            number = build.number,
            %status,
            retries = build.retries,
            "build failed"
        );
        let err = EngineError::BuildFailed {
            job: build.job_name.clone(),
            hash: build.hash.clone(),
            number: build.number,
            status,
        };
        self.upsert_build(cr, build).await?;
        Err(err)
    }

    async fn ensure_failed(
        &self,
        cr: &mut Jenkins,
        mut build: Build,
        params: &BTreeMap<String, String>,
        preserve: bool,
    ) -> Result<bool, EngineError> {
        if build.retries < BUILD_RETRIES {
            build.retries += 1;
            tracing::info!(job = %build.job_name, hash = %build.hash, retry = build.retries, "retrying build");
            self.submit(cr, build, params).await?;
            return Ok(false);
        }

        match self.jenkins.console_output(&build.job_name, build.number).await {
            Ok(logs) => tracing::error!(
                job = %build.job_name,
                hash = %build.hash,
                number = build.number,
                logs = %logs,
                "build retry limit reached"
            ),
            Err(e) => tracing::error!(
                job = %build.job_name,
                hash = %build.hash,
                number = build.number,
                error = %e,
                "build retry limit reached, console output unavailable"
            ),
        }
        if !preserve {
            self.remove_build(cr, &build).await?;
        }
        Err(EngineError::UnrecoverableBuildFailed {
            job: build.job_name,
            hash: build.hash,
            retries: build.retries,
        })
    }

    async fn ensure_expired(
        &self,
        cr: &mut Jenkins,
        mut build: Build,
        preserve: bool,
    ) -> Result<bool, EngineError> {
        tracing::info!(job = %build.job_name, number = build.number, "stopping expired build");
        self.jenkins.stop_build(&build.job_name, build.number).await?;

        let remote = self.jenkins.get_build(&build.job_name, build.number).await?;
        if remote.result.as_deref().and_then(BuildStatus::from_result) != Some(BuildStatus::Aborted) {
            return Err(EngineError::AbortFailed { job: build.job_name, number: build.number });
        }

        build.status = BuildStatus::Aborted;
        if preserve {
            self.upsert_build(cr, build).await?;
        } else {
            self.remove_build(cr, &build).await?;
        }
        Ok(true)
    }

    /// Capture the next build number, submit, and record the build as running.
    async fn submit(
        &self,
        cr: &mut Jenkins,
        mut build: Build,
        params: &BTreeMap<String, String>,
    ) -> Result<(), EngineError> {
        let number = self.jenkins.build_job(&build.job_name, params).await?;
        tracing::info!(job = %build.job_name, hash = %build.hash, number, "build submitted");
        build.number = number;
        build.status = BuildStatus::Running;
        self.upsert_build(cr, build).await
    }

    /// Replace the record for the same `(job, hash)`, or append it.
    async fn upsert_build(&self, cr: &mut Jenkins, mut build: Build) -> Result<(), EngineError> {
        let now = self.clock.now_time();
        build.last_update_time = Some(now.clone());
        let builds = &mut cr.status_mut().builds;
        match builds.iter_mut().find(|b| b.matches(&build.job_name, &build.hash)) {
            Some(existing) => *existing = build,
            None => {
                build.create_time.get_or_insert(now);
                builds.push(build);
            }
        }
        self.persist(cr).await
    }

    async fn remove_build(&self, cr: &mut Jenkins, build: &Build) -> Result<(), EngineError> {
        tracing::debug!(job = %build.job_name, hash = %build.hash, "removing build from status");
        forget_build(cr, &build.job_name, &build.hash);
        self.persist(cr).await
    }

    async fn persist(&self, cr: &mut Jenkins) -> Result<(), EngineError> {
        *cr = self.store.update_status(cr).await?;
        Ok(())
    }
}

/// Drop exactly the record for `(job, hash)` in memory, keeping every other build.
pub(crate) fn forget_build(cr: &mut Jenkins, job: &str, hash: &str) {
    let status = cr.status_mut();
    status.builds =
        std::mem::take(&mut status.builds).into_iter().filter(|b| !b.matches(job, hash)).collect();
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
