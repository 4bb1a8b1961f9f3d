// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin requirement checks.

use jop_adapters::InstalledPlugin;
use jop_core::{Plugin, PluginParseError, PluginRef};
use std::collections::{BTreeMap, HashMap};

/// Root requirements mapped to the plugins they depend on.
pub type RequirementSet = BTreeMap<Plugin, Vec<Plugin>>;

/// Pinned versions shared by every base requirement.
const PINNED: &[(&str, &str)] = &[
    ("configuration-as-code", "1.19"),
    ("configuration-as-code-support", "1.19"),
    ("credentials", "2.1.19"),
    ("durable-task", "1.29"),
    ("git", "3.10.0"),
    ("git-client", "2.7.7"),
    ("job-dsl", "1.74"),
    ("kubernetes", "1.15.7"),
    ("kubernetes-credentials", "0.4.0"),
    ("kubernetes-credentials-provider", "0.12.1"),
    ("plain-credentials", "1.5"),
    ("scm-api", "2.4.1"),
    ("script-security", "1.59"),
    ("structs", "1.19"),
    ("variant", "1.2"),
    ("workflow-aggregator", "2.6"),
    ("workflow-api", "2.34"),
    ("workflow-cps", "2.69"),
    ("workflow-job", "2.39"),
    ("workflow-scm-step", "2.7"),
    ("workflow-step-api", "2.19"),
    ("workflow-support", "3.3"),
];

const BASE: &[(&str, &[&str])] = &[
    ("configuration-as-code", &["configuration-as-code-support"]),
    (
        "git",
        &[
            "credentials",
            "git-client",
            "scm-api",
            "script-security",
            "structs",
            "workflow-api",
            "workflow-scm-step",
            "workflow-step-api",
        ],
    ),
    ("job-dsl", &["script-security", "structs"]),
    (
        "kubernetes",
        &[
            "credentials",
            "durable-task",
            "kubernetes-credentials",
            "plain-credentials",
            "structs",
            "variant",
            "workflow-step-api",
        ],
    ),
    ("kubernetes-credentials-provider", &["credentials", "structs", "variant"]),
    (
        "workflow-aggregator",
        &["workflow-api", "workflow-cps", "workflow-job", "workflow-step-api", "workflow-support"],
    ),
    (
        "workflow-job",
        &["scm-api", "script-security", "structs", "workflow-api", "workflow-step-api", "workflow-support"],
    ),
];

fn pinned(name: &str) -> Plugin {
    let version = PINNED.iter().find(|(n, _)| *n == name).map_or("", |(_, v)| v);
    Plugin { name: name.to_string(), version: version.to_string() }
}

/// Operator-mandated plugins and their pinned dependencies.
pub fn base_plugins() -> RequirementSet {
    BASE.iter()
        .map(|(root, deps)| (pinned(root), deps.iter().map(|d| pinned(d)).collect()))
        .collect()
}

/// Requirements declared on the resource, each a root with no dependencies.
pub fn requirements_from_refs(refs: &[PluginRef]) -> Result<RequirementSet, PluginParseError> {
    refs.iter()
        .map(|r| Ok((Plugin::new(&r.name, &r.version)?, Vec::new())))
        .collect()
}

/// Check that every plugin name is required at a single version across all
/// sets. Roots count as requirements on themselves. Each conflicting pair is
/// logged with the roots that demanded it.
pub fn verify_dependencies(sets: &[RequirementSet]) -> bool {
    // name -> [(version, root)]
    let mut required: HashMap<&str, Vec<(&str, &Plugin)>> = HashMap::new();
    for set in sets {
        for (root, deps) in set {
            required.entry(root.name.as_str()).or_default().push((&root.version, root));
            for dep in deps {
                required.entry(dep.name.as_str()).or_default().push((&dep.version, root));
            }
        }
    }

    let mut valid = true;
    for (name, versions) in &required {
        for (i, (first, first_root)) in versions.iter().enumerate() {
            for (second, second_root) in &versions[i + 1..] {
                if first != second {
                    tracing::warn!(
                        plugin = %name,
                        %first_root,
                        first_version = %first,
                        %second_root,
                        second_version = %second,
                        "conflicting plugin versions required"
                    );
                    valid = false;
                }
            }
        }
    }
    valid
}

/// Check that every required plugin is installed, usable, and at the
/// required version. Each mismatch is logged.
pub fn verify_installed(required: &[Plugin], installed: &[InstalledPlugin]) -> bool {
    let by_name: HashMap<&str, &InstalledPlugin> =
        installed.iter().map(|p| (p.short_name.as_str(), p)).collect();

    let mut valid = true;
    for plugin in required {
        match by_name.get(plugin.name.as_str()) {
            Some(found) if !found.is_usable() => {
                tracing::warn!(%plugin, "plugin installed but not active");
                valid = false;
            }
            Some(found) if found.version != plugin.version => {
                tracing::warn!(%plugin, actual = %found.version, "incompatible plugin version");
                valid = false;
            }
            Some(_) => {}
            None => {
                tracing::warn!(%plugin, "missing plugin");
                valid = false;
            }
        }
    }
    valid
}

#[cfg(test)]
#[path = "plugins_tests.rs"]
mod tests;
