// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Explicit include-sample filter carried by a query.
///
/// `None` is the sentinel for "return no sample data at all". Leaving the
/// filter unset is interpreted by storage engines as "all samples", so the
/// gateway always injects one of these before delegating a query that
/// returns sample data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleInclusion {
    None,
    Samples(Vec<String>),
}

/// A variant query as received by the gateway.
///
/// Structured fields cover the catalog-interpreted parts; anything else is
/// forwarded untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantQuery {
    /// Explicit project scope.
    pub project: Option<String>,
    /// General study filter.
    pub study: Vec<String>,
    /// Studies whose data must be present in the response.
    pub include_study: Vec<String>,
    /// Explicitly named samples to filter and return.
    pub sample: Vec<String>,
    /// Samples whose data must be present in the response. Injected by the
    /// gateway when absent.
    pub include_sample: Option<SampleInclusion>,
    /// Free-form `key<op>value;...` expression over catalog sample
    /// annotations, rewritten into `sample` by the gateway.
    pub sample_annotation: Option<String>,
    /// Genomic regions, passed through to the engine.
    pub region: Vec<String>,
    /// Composite variant-annotation predicates, engine vocabulary.
    pub annotation: Vec<String>,
    /// Catalog-side clinical filters this core does not interpret beyond
    /// rejecting them (family, proband, segregation mode, panel).
    pub family: Option<String>,
    pub panel: Option<String>,
    /// Engine-native predicates forwarded verbatim.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl VariantQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the caller explicitly listed samples to return.
    #[must_use]
    pub fn has_explicit_samples(&self) -> bool {
        !self.sample.is_empty()
            || matches!(&self.include_sample, Some(SampleInclusion::Samples(s)) if !s.is_empty())
    }

    /// Samples the caller explicitly named, if any.
    #[must_use]
    pub fn explicit_samples(&self) -> Vec<String> {
        if !self.sample.is_empty() {
            return self.sample.clone();
        }
        match &self.include_sample {
            Some(SampleInclusion::Samples(samples)) => samples.clone(),
            _ => Vec::new(),
        }
    }
}
