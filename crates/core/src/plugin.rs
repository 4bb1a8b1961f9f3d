// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin requirement (`name:version`).

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static NAME_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9a-z-]+$").ok());
static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9.]+$").ok());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginParseError {
    #[error("invalid plugin format '{0}', expected 'name:version'")]
    Format(String),
    #[error("invalid plugin name '{0}', must match ^[0-9a-z-]+$")]
    Name(String),
    #[error("invalid plugin version '{0}', must match ^[0-9.]+$")]
    Version(String),
}

/// A required plugin at an exact version.
///
/// Ephemeral: built per verification call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Plugin {
    pub name: String,
    pub version: String,
}

impl Plugin {
    /// Build a validated plugin requirement.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, PluginParseError> {
        let plugin = Self { name: name.into(), version: version.into() };
        if !matches_pattern(&NAME_PATTERN, &plugin.name) {
            return Err(PluginParseError::Name(plugin.to_string()));
        }
        if !matches_pattern(&VERSION_PATTERN, &plugin.version) {
            return Err(PluginParseError::Version(plugin.to_string()));
        }
        Ok(plugin)
    }
}

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

impl FromStr for Plugin {
    type Err = PluginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) =
            s.split_once(':').ok_or_else(|| PluginParseError::Format(s.to_string()))?;
        Self::new(name, version)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
