// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automation server client over the raw HTTP transport.

use super::http::{self, Endpoint, HttpResponse};
use super::{InstalledPlugin, JenkinsBuild, JenkinsClient, JenkinsError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const FORM: &str = "application/x-www-form-urlencoded";
const XML: &str = "application/xml";

/// API user and token for basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("user", &self.user).finish_non_exhaustive()
    }
}

struct Inner {
    endpoint: Endpoint,
    authorization: String,
    timeout: Duration,
}

/// Jenkins REST API client.
#[derive(Clone)]
pub struct HttpJenkinsClient {
    inner: Arc<Inner>,
}

impl HttpJenkinsClient {
    pub fn new(url: &str, credentials: &Credentials, timeout: Duration) -> Result<Self, JenkinsError> {
        let endpoint = Endpoint::parse(url)?;
        let token = STANDARD.encode(format!("{}:{}", credentials.user, credentials.token));
        Ok(Self {
            inner: Arc::new(Inner { endpoint, authorization: format!("Basic {}", token), timeout }),
        })
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<(&str, &str)>,
    ) -> Result<String, JenkinsError> {
        let request =
            http::format_request(method, &self.inner.endpoint, path, &self.inner.authorization, body);
        let HttpResponse { status, body } =
            http::send(&self.inner.endpoint.addr, &request, self.inner.timeout).await?;
        match status {
            404 => Err(JenkinsError::NotFound(path.to_string())),
            code if code >= 400 => Err(JenkinsError::Status { code, body: body.trim().to_string() }),
            _ => Ok(body),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, JenkinsError> {
        let body = self.request("GET", path, None).await?;
        serde_json::from_str(&body).map_err(|e| JenkinsError::Decode(format!("{}: {}", path, e)))
    }
}

fn job_path(name: &str) -> String {
    format!("/job/{}", http::percent_encode(name))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobInfo {
    next_build_number: i64,
}

#[derive(Deserialize)]
struct PluginList {
    #[serde(default)]
    plugins: Vec<InstalledPlugin>,
}

/// Wrap a script so that a marker is printed only if it ran to completion.
pub(super) fn with_verifier(script: &str, verifier: &str) -> String {
    format!("{}\nprintln \"{}\"\n", script, verifier)
}

/// Strip the completion marker, or fail with the full output.
pub(super) fn check_verifier(output: String, verifier: &str) -> Result<String, JenkinsError> {
    let trimmed = output.trim_end();
    match trimmed.strip_suffix(verifier) {
        Some(logs) => Ok(logs.trim_end().to_string()),
        None => Err(JenkinsError::ScriptFailed { logs: output }),
    }
}

#[async_trait]
impl JenkinsClient for HttpJenkinsClient {
    async fn create_or_update_job(
        &self,
        config_xml: &str,
        name: &str,
    ) -> Result<bool, JenkinsError> {
        let config_path = format!("{}/config.xml", job_path(name));
        match self.request("GET", &config_path, None).await {
            Ok(current) if current.trim() == config_xml.trim() => Ok(false),
            Ok(_) => {
                self.request("POST", &config_path, Some((XML, config_xml))).await?;
                tracing::info!(job = name, "updated job configuration");
                Ok(false)
            }
            Err(e) if e.is_not_found() => {
                let path = format!("/createItem?name={}", http::percent_encode(name));
                self.request("POST", &path, Some((XML, config_xml))).await?;
                tracing::info!(job = name, "created job");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn build_job(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<i64, JenkinsError> {
        let info: JobInfo =
            self.get_json(&format!("{}/api/json?tree=nextBuildNumber", job_path(name))).await?;
        let body = http::form_encode(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.request("POST", &format!("{}/buildWithParameters", job_path(name)), Some((FORM, &body)))
            .await?;
        Ok(info.next_build_number)
    }

    async fn get_build(&self, name: &str, number: i64) -> Result<JenkinsBuild, JenkinsError> {
        self.get_json(&format!("{}/{}/api/json?tree=number,result,building", job_path(name), number))
            .await
    }

    async fn console_output(&self, name: &str, number: i64) -> Result<String, JenkinsError> {
        self.request("GET", &format!("{}/{}/consoleText", job_path(name), number), None).await
    }

    async fn stop_build(&self, name: &str, number: i64) -> Result<(), JenkinsError> {
        self.request("POST", &format!("{}/{}/stop", job_path(name), number), None).await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<String, JenkinsError> {
        let verifier = uuid::Uuid::new_v4().to_string();
        let body = http::form_encode([("script", with_verifier(script, &verifier).as_str())]);
        let output = self.request("POST", "/scriptText", Some((FORM, &body))).await?;
        check_verifier(output, &verifier)
    }

    async fn get_plugins(&self) -> Result<Vec<InstalledPlugin>, JenkinsError> {
        let list: PluginList = self
            .get_json("/pluginManager/api/json?tree=plugins[shortName,version,active,enabled,deleted]")
            .await?;
        Ok(list.plugins)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
