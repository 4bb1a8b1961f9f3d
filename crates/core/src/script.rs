// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provenance record for scripts confirmed applied on the automation server.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Asserts that this exact script body, from this source, was confirmed executed.
///
/// Records are only ever appended (or replaced for the same
/// type/source/name); a matching record lets a pass skip resubmission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedGroovyScript {
    /// Which configuration phase applied it (e.g. `user-groovy`)
    pub configuration_type: String,
    /// Name of the collection the script came from (e.g. a ConfigMap)
    pub source: String,
    pub name: String,
    pub hash: String,
}

impl AppliedGroovyScript {
    pub fn new(
        configuration_type: impl Into<String>,
        source: impl Into<String>,
        name: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            configuration_type: configuration_type.into(),
            source: source.into(),
            name: name.into(),
            hash: hash.into(),
        }
    }

    /// Same script slot, regardless of hash.
    pub fn same_slot(&self, other: &AppliedGroovyScript) -> bool {
        self.configuration_type == other.configuration_type
            && self.source == other.source
            && self.name == other.name
    }
}
