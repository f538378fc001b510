// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use varcat_model::{
    Aggregation, Bioformat, CohortId, CohortStatus, DataCategory, DataStore, FileId,
    FileIndexStatus, SampleId, StudyId,
};

/// Authenticated caller identity, resolved from a session token by the
/// catalog backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Caller(pub String);

impl Caller {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Catalog view of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectEntry {
    /// Fully qualified name, `owner@alias`.
    pub fqn: String,
    pub alias: String,
    pub owner: String,
    /// Explicit per-category datastore overrides.
    #[serde(default)]
    pub datastores: BTreeMap<DataCategory, DataStore>,
}

/// Catalog view of a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyEntry {
    pub id: StudyId,
    pub alias: String,
    /// Fully qualified name, `owner@projectAlias:studyAlias`.
    pub fqn: String,
    pub project_fqn: String,
    /// Pre-aggregation convention of variant statistics, when declared.
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
    /// Explicit per-category datastore overrides.
    #[serde(default)]
    pub datastores: BTreeMap<DataCategory, DataStore>,
}

/// Catalog view of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub id: FileId,
    pub name: String,
    pub bioformat: Bioformat,
    /// Samples the file defines, in original header order.
    pub samples: Vec<SampleId>,
    #[serde(default)]
    pub index_status: FileIndexStatus,
    /// Whether a transformed artifact exists for this file.
    #[serde(default)]
    pub has_transformed_file: bool,
    /// Stored variant-file header blob, when the file carries one.
    #[serde(default)]
    pub variant_header: Option<String>,
}

/// Catalog view of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleEntry {
    pub id: SampleId,
    pub name: String,
    /// Free-form sample annotations, `key -> value`.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Catalog view of a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CohortEntry {
    pub id: CohortId,
    pub name: String,
    pub samples: Vec<SampleId>,
    #[serde(default)]
    pub status: CohortStatus,
}
