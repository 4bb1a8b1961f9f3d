// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory automation server for tests.

use super::{InstalledPlugin, JenkinsBuild, JenkinsClient, JenkinsError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// Recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JenkinsCall {
    CreateOrUpdateJob { name: String, config_xml: String },
    BuildJob { name: String, params: BTreeMap<String, String> },
    GetBuild { name: String, number: i64 },
    ConsoleOutput { name: String, number: i64 },
    StopBuild { name: String, number: i64 },
    ExecuteScript { script: String },
    GetPlugins,
}

struct FakeBuild {
    result: Option<String>,
    building: bool,
    visible: bool,
}

struct FakeJob {
    config_xml: Option<String>,
    next_build_number: i64,
    builds: BTreeMap<i64, FakeBuild>,
}

impl Default for FakeJob {
    fn default() -> Self {
        Self { config_xml: None, next_build_number: 1, builds: BTreeMap::new() }
    }
}

struct FakeJenkinsState {
    calls: Vec<JenkinsCall>,
    jobs: HashMap<String, FakeJob>,
    plugins: Vec<InstalledPlugin>,
    script_failures: VecDeque<String>,
    hide_new_builds: bool,
    stop_aborts: bool,
}

/// Fake automation server.
///
/// Submitted builds are visible and running until a result is set. Stopping
/// a build marks it `ABORTED` unless disabled with [`Self::set_stop_aborts`].
#[derive(Clone)]
pub struct FakeJenkinsClient {
    inner: Arc<Mutex<FakeJenkinsState>>,
}

impl Default for FakeJenkinsClient {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeJenkinsState {
                calls: Vec::new(),
                jobs: HashMap::new(),
                plugins: Vec::new(),
                script_failures: VecDeque::new(),
                hide_new_builds: false,
                stop_aborts: true,
            })),
        }
    }
}

impl FakeJenkinsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<JenkinsCall> {
        self.inner.lock().calls.clone()
    }

    /// Parameters of every build submitted for `name`, in order.
    pub fn submissions(&self, name: &str) -> Vec<BTreeMap<String, String>> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                JenkinsCall::BuildJob { name: n, params } if n == name => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bodies of every script sent to the script console, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                JenkinsCall::ExecuteScript { script } => Some(script.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn job_config(&self, name: &str) -> Option<String> {
        self.inner.lock().jobs.get(name).and_then(|j| j.config_xml.clone())
    }

    /// Number of the most recent build of `name`.
    pub fn last_build_number(&self, name: &str) -> Option<i64> {
        self.inner.lock().jobs.get(name).and_then(|j| j.builds.keys().next_back().copied())
    }

    /// Report a terminal result (e.g. `SUCCESS`, `FAILURE`) for a build.
    pub fn set_build_result(&self, name: &str, number: i64, result: &str) {
        let mut state = self.inner.lock();
        let job = state.jobs.entry(name.to_string()).or_default();
        job.builds.insert(
            number,
            FakeBuild { result: Some(result.to_string()), building: false, visible: true },
        );
    }

    /// Report a terminal result for the most recent build of `name`.
    pub fn finish_last_build(&self, name: &str, result: &str) {
        if let Some(number) = self.last_build_number(name) {
            self.set_build_result(name, number, result);
        }
    }

    /// Make a hidden build visible and running.
    pub fn reveal_build(&self, name: &str, number: i64) {
        let mut state = self.inner.lock();
        if let Some(build) = state.jobs.get_mut(name).and_then(|j| j.builds.get_mut(&number)) {
            build.visible = true;
        }
    }

    /// New builds return `NotFound` until revealed or given a result.
    pub fn hide_new_builds(&self, hide: bool) {
        self.inner.lock().hide_new_builds = hide;
    }

    pub fn set_stop_aborts(&self, aborts: bool) {
        self.inner.lock().stop_aborts = aborts;
    }

    /// The next script execution fails with these logs.
    pub fn fail_next_script(&self, logs: &str) {
        self.inner.lock().script_failures.push_back(logs.to_string());
    }

    pub fn set_plugins(&self, plugins: Vec<InstalledPlugin>) {
        self.inner.lock().plugins = plugins;
    }
}

fn not_found(name: &str, number: i64) -> JenkinsError {
    JenkinsError::NotFound(format!("/job/{}/{}", name, number))
}

#[async_trait]
impl JenkinsClient for FakeJenkinsClient {
    async fn create_or_update_job(
        &self,
        config_xml: &str,
        name: &str,
    ) -> Result<bool, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::CreateOrUpdateJob {
            name: name.to_string(),
            config_xml: config_xml.to_string(),
        });
        let job = state.jobs.entry(name.to_string()).or_default();
        let created = job.config_xml.is_none();
        job.config_xml = Some(config_xml.to_string());
        Ok(created)
    }

    async fn build_job(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<i64, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::BuildJob { name: name.to_string(), params: params.clone() });
        let visible = !state.hide_new_builds;
        let job = state.jobs.entry(name.to_string()).or_default();
        let number = job.next_build_number;
        job.next_build_number += 1;
        job.builds.insert(number, FakeBuild { result: None, building: true, visible });
        Ok(number)
    }

    async fn get_build(&self, name: &str, number: i64) -> Result<JenkinsBuild, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::GetBuild { name: name.to_string(), number });
        match state.jobs.get(name).and_then(|j| j.builds.get(&number)) {
            Some(build) if build.visible => Ok(JenkinsBuild {
                number,
                result: build.result.clone(),
                building: build.building,
            }),
            _ => Err(not_found(name, number)),
        }
    }

    async fn console_output(&self, name: &str, number: i64) -> Result<String, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::ConsoleOutput { name: name.to_string(), number });
        match state.jobs.get(name).and_then(|j| j.builds.get(&number)) {
            Some(build) => Ok(format!(
                "Started build #{}\nFinished: {}\n",
                number,
                build.result.as_deref().unwrap_or("RUNNING")
            )),
            None => Err(not_found(name, number)),
        }
    }

    async fn stop_build(&self, name: &str, number: i64) -> Result<(), JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::StopBuild { name: name.to_string(), number });
        let aborts = state.stop_aborts;
        let build = state
            .jobs
            .get_mut(name)
            .and_then(|j| j.builds.get_mut(&number))
            .ok_or_else(|| not_found(name, number))?;
        if aborts {
            build.result = Some("ABORTED".to_string());
            build.building = false;
            build.visible = true;
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<String, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::ExecuteScript { script: script.to_string() });
        match state.script_failures.pop_front() {
            Some(logs) => Err(JenkinsError::ScriptFailed { logs }),
            None => Ok(String::new()),
        }
    }

    async fn get_plugins(&self) -> Result<Vec<InstalledPlugin>, JenkinsError> {
        let mut state = self.inner.lock();
        state.calls.push(JenkinsCall::GetPlugins);
        Ok(state.plugins.clone())
    }
}
