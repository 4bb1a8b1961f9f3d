// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hash-gated script application.
//!
//! Scripts come from named sources (config maps). Each source is applied as
//! one batch through the configuration job, keyed by a digest over its
//! selected scripts; applied scripts are recorded in status so unchanged
//! batches are skipped on later passes.

use crate::error::EngineError;
use crate::jobs::{forget_build, Jobs};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jop_adapters::{JenkinsClient, JenkinsError, StatusStore};
use jop_core::{AppliedGroovyScript, Clock, Jenkins};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Job parameter carrying the source (config map) name.
pub const SOURCE_PARAM: &str = "SOURCE";
/// Job parameter listing the selected script names, one per line.
pub const SCRIPTS_PARAM: &str = "SCRIPTS";
/// Job parameter the job compares against the mounted files before running.
pub const FILES_HASH_PARAM: &str = "FILES_HASH";
/// Job parameter carrying the batch key; makes each submission distinct.
pub const HASH_PARAM: &str = "HASH";

const IMPORT_PREFIX: &str = "import ";

/// A named collection of script bodies, e.g. the data of one config map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSource {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

impl ScriptSource {
    pub fn new(name: impl Into<String>, data: BTreeMap<String, String>) -> Self {
        Self { name: name.into(), data }
    }
}

/// SHA-256 over every entry in name order, base64 encoded.
///
/// Each name and body is preceded by its byte length as a big-endian `u64`,
/// so moving bytes between a name and its body changes the digest. Input
/// order does not matter. The mounted-file check in the configuration job
/// computes the same digest over file names and contents.
pub fn calculate_hash<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut entries: Vec<_> = entries.into_iter().collect();
    entries.sort();
    let mut hasher = Sha256::new();
    for (name, body) in entries {
        for field in [name, body] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
    }
    STANDARD.encode(hasher.finalize())
}

/// Transform that prepends a loader filling a `secrets` map from files
/// mounted at `secrets_path`. The loader goes after any leading imports.
pub fn add_secrets_loader(secrets_path: &str) -> impl Fn(&str) -> String {
    let loader = format!(
        "def secretsPath = '{}'\ndef secrets = [:]\n\"ls ${{secretsPath}}\".execute().text.eachLine {{secrets[it] = new File(\"${{secretsPath}}/${{it}}\").text}}",
        secrets_path
    );
    move |script: &str| {
        if !script.starts_with(IMPORT_PREFIX) {
            return format!("{}\n{}", loader, script);
        }
        let lines: Vec<&str> = script.split('\n').collect();
        let split = lines.iter().position(|l| !l.starts_with(IMPORT_PREFIX)).unwrap_or(lines.len());
        format!("{}\n\n{}\n\n{}", lines[..split].join("\n"), loader, lines[split..].join("\n"))
    }
}

/// Selects groovy script entries.
pub fn is_groovy(name: &str) -> bool {
    name.ends_with(".groovy")
}

/// Selects configuration-as-code entries.
pub fn is_yaml(name: &str) -> bool {
    name.ends_with(".yaml") || name.ends_with(".yml")
}

/// How the configuration job applies each mounted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Applier {
    /// Evaluate the file as a groovy script with the `secrets` map bound
    #[default]
    Groovy,
    /// Hand the file to the configuration-as-code plugin as a YAML source
    Casc,
}

impl Applier {
    fn stage(&self) -> &'static str {
        match self {
            Applier::Groovy => GROOVY_STAGE,
            Applier::Casc => CASC_STAGE,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Applier::Groovy => "Applies groovy scripts mounted from config maps",
            Applier::Casc => "Applies configuration-as-code files mounted from config maps",
        }
    }
}

/// One source's selected scripts and the keys they are applied under.
struct Batch {
    source: String,
    names: Vec<String>,
    files_hash: String,
    hash: String,
}

/// Applies scripts of one configuration type (e.g. `user-groovy`).
#[derive(Clone)]
pub struct Groovy<J, S, C> {
    jenkins: J,
    store: S,
    jobs: Jobs<J, S, C>,
    configuration_type: String,
    job_name: String,
    applier: Applier,
    secret: BTreeMap<String, String>,
}

impl<J, S, C> Groovy<J, S, C>
where
    J: JenkinsClient,
    S: StatusStore,
    C: Clock,
{
    /// `job_name` is the configuration job batches are submitted through.
    pub fn new(
        jenkins: J,
        store: S,
        clock: C,
        configuration_type: impl Into<String>,
        job_name: impl Into<String>,
    ) -> Self {
        Self {
            jobs: Jobs::new(jenkins.clone(), store.clone(), clock),
            jenkins,
            store,
            configuration_type: configuration_type.into(),
            job_name: job_name.into(),
            applier: Applier::default(),
            secret: BTreeMap::new(),
        }
    }

    pub fn with_applier(mut self, applier: Applier) -> Self {
        self.applier = applier;
        self
    }

    /// Secret data mounted for the scripts; a change re-applies every batch.
    pub fn with_secret(mut self, secret: BTreeMap<String, String>) -> Self {
        self.secret = secret;
        self
    }

    /// Create or update the configuration job.
    ///
    /// The job waits until the scripts mounted under `scripts_path/<source>`
    /// hash to `FILES_HASH` (10 tries, 2s apart) before evaluating them, so a
    /// batch never runs against a stale volume.
    pub async fn configure_job(
        &self,
        scripts_path: &str,
        secrets_path: &str,
    ) -> Result<bool, EngineError> {
        let created = self
            .jenkins
            .create_or_update_job(
                &configuration_job_xml(self.applier, scripts_path, secrets_path),
                &self.job_name,
            )
            .await?;
        if created {
            tracing::info!(job = %self.job_name, "configuration job created");
        }
        Ok(created)
    }

    /// Run one script through the script console unless already applied.
    ///
    /// Returns `Ok(true)` after executing, so the caller requeues and sees
    /// the recorded state on its next pass.
    pub async fn ensure_single(
        &self,
        cr: &mut Jenkins,
        source: &str,
        name: &str,
        hash: &str,
        script: &str,
    ) -> Result<bool, EngineError> {
        if self.is_applied(cr, source, name, hash) {
            tracing::debug!(source, name, "script already applied");
            return Ok(false);
        }

        tracing::info!(kind = %self.configuration_type, source, name, "executing script");
        if let Err(e) = self.jenkins.execute_script(script).await {
            if let JenkinsError::ScriptFailed { logs } = &e {
                tracing::warn!(kind = %self.configuration_type, source, name, %logs, "script execution failed");
            }
            return Err(e.into());
        }

        self.record(cr, source, [name], hash);
        *cr = self.store.update_status(cr).await?;
        Ok(true)
    }

    /// Apply every source's selected scripts, one batch per source.
    ///
    /// Returns `Ok(true)` while a batch is in flight and `Ok(false)` once all
    /// selected scripts are recorded as applied. On convergence, build records
    /// of this job that belong to no current batch are dropped.
    pub async fn ensure(
        &self,
        cr: &mut Jenkins,
        sources: &[ScriptSource],
        select: impl Fn(&str) -> bool,
        transform: impl Fn(&str) -> String,
    ) -> Result<bool, EngineError> {
        let batches: Vec<Batch> =
            sources.iter().filter_map(|source| self.batch(source, &select, &transform)).collect();

        for batch in &batches {
            if batch.names.iter().all(|name| self.is_applied(cr, &batch.source, name, &batch.hash)) {
                continue;
            }

            let params = BTreeMap::from([
                (SOURCE_PARAM.to_string(), batch.source.clone()),
                (SCRIPTS_PARAM.to_string(), batch.names.join("\n")),
                (FILES_HASH_PARAM.to_string(), batch.files_hash.clone()),
                (HASH_PARAM.to_string(), batch.hash.clone()),
            ]);
            tracing::info!(kind = %self.configuration_type, source = %batch.source, hash = %batch.hash, "applying scripts");

            if !self.jobs.ensure_build_job(cr, &self.job_name, &batch.hash, &params, true).await? {
                return Ok(true);
            }

            // Scripts and build record change in one write
            self.record(cr, &batch.source, batch.names.iter().map(String::as_str), &batch.hash);
            forget_build(cr, &self.job_name, &batch.hash);
            *cr = self.store.update_status(cr).await?;
            tracing::info!(kind = %self.configuration_type, source = %batch.source, hash = %batch.hash, "scripts applied");
        }

        self.prune_builds(cr, &batches).await?;
        Ok(false)
    }

    fn batch(
        &self,
        source: &ScriptSource,
        select: impl Fn(&str) -> bool,
        transform: impl Fn(&str) -> String,
    ) -> Option<Batch> {
        let selected: Vec<(&str, &str)> = source
            .data
            .iter()
            .filter(|(name, _)| select(name.as_str()))
            .map(|(name, body)| (name.as_str(), body.as_str()))
            .collect();
        if selected.is_empty() {
            tracing::debug!(source = %source.name, "no scripts selected");
            return None;
        }

        let transformed: Vec<(&str, String)> =
            selected.iter().map(|(name, body)| (*name, transform(body))).collect();
        Some(Batch {
            source: source.name.clone(),
            names: selected.iter().map(|(name, _)| name.to_string()).collect(),
            files_hash: calculate_hash(selected.iter().copied()),
            hash: self.batch_key(transformed.iter().map(|(n, b)| (*n, b.as_str()))),
        })
    }

    /// Drop records of this job left by failed or superseded batches.
    async fn prune_builds(&self, cr: &mut Jenkins, batches: &[Batch]) -> Result<(), EngineError> {
        let builds = &mut cr.status_mut().builds;
        let before = builds.len();
        builds.retain(|build| {
            build.job_name != self.job_name || batches.iter().any(|batch| batch.hash == build.hash)
        });
        let removed = before - builds.len();
        if removed == 0 {
            return Ok(());
        }
        tracing::info!(job = %self.job_name, removed, "dropped stale build records");
        *cr = self.store.update_status(cr).await?;
        Ok(())
    }

    /// Script digest, prefixed with the secret digest when a secret is set.
    fn batch_key<'a>(&self, scripts: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
        let scripts_hash = calculate_hash(scripts);
        if self.secret.is_empty() {
            return scripts_hash;
        }
        let secret_hash = calculate_hash(self.secret.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        format!("{}{}", secret_hash, scripts_hash)
    }

    fn is_applied(&self, cr: &Jenkins, source: &str, name: &str, hash: &str) -> bool {
        cr.status.as_ref().is_some_and(|status| {
            status.applied_groovy_scripts.iter().any(|s| {
                s.configuration_type == self.configuration_type
                    && s.source == source
                    && s.name == name
                    && s.hash == hash
            })
        })
    }

    /// Record scripts as applied, replacing only older records for the same
    /// type, source, and name.
    fn record<'a>(
        &self,
        cr: &mut Jenkins,
        source: &str,
        names: impl IntoIterator<Item = &'a str>,
        hash: &str,
    ) {
        let applied = &mut cr.status_mut().applied_groovy_scripts;
        for name in names {
            let record = AppliedGroovyScript::new(&self.configuration_type, source, name, hash);
            applied.retain(|existing| !existing.same_slot(&record));
            applied.push(record);
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

const PIPELINE: &str = r#"def scriptsPath = '{scripts_path}'
def secretsPath = '{secrets_path}'

node('master') {
    def source = params.SOURCE
    def scripts = params.SCRIPTS.tokenize('\n')

    stage('Synchronizing files') {
        synchronizeFiles("${scriptsPath}/${source}", (String[])scripts, params.FILES_HASH)
    }

    for (script in scripts) {
        stage(script) {
{stage}
        }
    }
}

def synchronizeFiles(String path, String[] files, String hash) {
    def complete = false
    for (int i = 1; i <= 10; i++) {
        def actualHash = calculateHash(files, path)
        println "Expected hash '${hash}', actual hash '${actualHash}', path '${path}'"
        if (hash == actualHash) {
            complete = true
            break
        }
        sleep 2
    }
    if (!complete) {
        error("Timeout while synchronizing files")
    }
}

@NonCPS
def calculateHash(String[] files, String path) {
    def hash = java.security.MessageDigest.getInstance("SHA-256")
    for (file in files.sort()) {
        def name = file.getBytes('UTF-8')
        def body = java.nio.file.Files.readAllBytes(java.nio.file.Paths.get("${path}/${file}"))
        hash.update(java.nio.ByteBuffer.allocate(8).putLong(name.length).array())
        hash.update(name)
        hash.update(java.nio.ByteBuffer.allocate(8).putLong(body.length).array())
        hash.update(body)
    }
    return Base64.getEncoder().encodeToString(hash.digest())
}"#;

const GROOVY_STAGE: &str = r#"            def secrets = [:]
            "ls ${secretsPath}".execute().text.eachLine {secrets[it] = new File("${secretsPath}/${it}").text}
            def shell = new GroovyShell(new Binding([secrets: secrets]))
            shell.evaluate(new File("${scriptsPath}/${source}/${script}").text)"#;

const CASC_STAGE: &str = r#"            def path = java.nio.file.Paths.get("${scriptsPath}/${source}/${script}")
            def yaml = new io.jenkins.plugins.casc.yaml.YamlSource(path, io.jenkins.plugins.casc.yaml.YamlSource.READ_FROM_PATH)
            io.jenkins.plugins.casc.ConfigurationAsCode.get().configureWith(yaml)"#;

/// Pipeline job definition for a configuration job.
pub fn configuration_job_xml(applier: Applier, scripts_path: &str, secrets_path: &str) -> String {
    let pipeline = PIPELINE
        .replace("{stage}", applier.stage())
        .replace("{scripts_path}", scripts_path)
        .replace("{secrets_path}", secrets_path);
    format!(
        r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <actions/>
  <description>{description}</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    <org.jenkinsci.plugins.workflow.job.properties.DisableConcurrentBuildsJobProperty/>
    <hudson.model.ParametersDefinitionProperty>
      <parameterDefinitions>
{params}
      </parameterDefinitions>
    </hudson.model.ParametersDefinitionProperty>
  </properties>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps">
    <script>{script}</script>
    <sandbox>false</sandbox>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>
"#,
        params = [SOURCE_PARAM, SCRIPTS_PARAM, FILES_HASH_PARAM, HASH_PARAM]
            .iter()
            .map(|name| string_parameter(name))
            .collect::<Vec<_>>()
            .join("\n"),
        script = xml_escape(&pipeline),
        description = applier.description(),
    )
}

fn string_parameter(name: &str) -> String {
    format!(
        "        <hudson.model.StringParameterDefinition>\n          <name>{}</name>\n          <defaultValue/>\n          <trim>false</trim>\n        </hudson.model.StringParameterDefinition>",
        name
    )
}

#[cfg(test)]
#[path = "groovy_tests.rs"]
mod tests;
