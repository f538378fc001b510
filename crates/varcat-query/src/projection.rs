// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Response sections a caller can request through INCLUDE/EXCLUDE.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResponseField {
    Studies,
    StudiesSamples,
    StudiesFiles,
    StudiesStats,
    Annotation,
}

impl ResponseField {
    const ALL: [Self; 5] = [
        Self::Studies,
        Self::StudiesSamples,
        Self::StudiesFiles,
        Self::StudiesStats,
        Self::Annotation,
    ];

    /// Section containing this one, if nested.
    #[must_use]
    const fn parent(self) -> Option<Self> {
        match self {
            Self::StudiesSamples | Self::StudiesFiles | Self::StudiesStats => Some(Self::Studies),
            Self::Studies | Self::Annotation => None,
        }
    }
}

/// Field projection options of a query. An empty include list means
/// "everything not excluded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryProjection {
    pub include: BTreeSet<ResponseField>,
    pub exclude: BTreeSet<ResponseField>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl QueryProjection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn including(fields: impl IntoIterator<Item = ResponseField>) -> Self {
        Self {
            include: fields.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn excluding(fields: impl IntoIterator<Item = ResponseField>) -> Self {
        Self {
            exclude: fields.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Sections the response will actually contain. An explicit include
    /// list wins and implies the parent sections of anything nested;
    /// otherwise everything minus the exclusions, where excluding a parent
    /// drops its children too.
    #[must_use]
    pub fn effective_fields(&self) -> BTreeSet<ResponseField> {
        if !self.include.is_empty() {
            let mut fields = self.include.clone();
            for field in &self.include {
                if let Some(parent) = field.parent() {
                    fields.insert(parent);
                }
            }
            return fields;
        }
        ResponseField::ALL
            .into_iter()
            .filter(|field| {
                !self.exclude.contains(field)
                    && field.parent().map_or(true, |p| !self.exclude.contains(&p))
            })
            .collect()
    }

    #[must_use]
    pub fn returns_studies(&self) -> bool {
        self.effective_fields().contains(&ResponseField::Studies)
    }

    #[must_use]
    pub fn returns_sample_data(&self) -> bool {
        self.effective_fields()
            .contains(&ResponseField::StudiesSamples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_projection_returns_everything() {
        let projection = QueryProjection::new();
        assert!(projection.returns_studies());
        assert!(projection.returns_sample_data());
    }

    #[test]
    fn include_of_nested_field_implies_parent() {
        let projection = QueryProjection::including([ResponseField::StudiesSamples]);
        assert!(projection.returns_studies());
        assert!(projection.returns_sample_data());
    }

    #[test]
    fn excluding_studies_drops_sample_data() {
        let projection = QueryProjection::excluding([ResponseField::Studies]);
        assert!(!projection.returns_studies());
        assert!(!projection.returns_sample_data());
    }

    #[test]
    fn include_without_samples_skips_sample_data() {
        let projection = QueryProjection::including([ResponseField::Annotation]);
        assert!(!projection.returns_studies());
        assert!(!projection.returns_sample_data());
    }
}
