// SPDX-License-Identifier: Apache-2.0

use crate::bimap::IdMap;
use crate::ids::{CohortId, FileId, SampleId, StudyId};
use crate::status::{Aggregation, CohortStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the cohort holding every sample of a study. Its id is registered
/// during sync but its membership is managed by the storage side.
pub const DEFAULT_COHORT: &str = "ALL";

/// Storage-engine-owned record of identity mappings and ingestion and
/// statistics status for one study.
///
/// `indexed_files` is write-owned by the storage side: the catalog
/// synchronizer may only seed it when the record is newly created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyMetadata {
    pub study_id: StudyId,
    pub study_name: String,
    pub file_ids: IdMap<FileId>,
    pub sample_ids: IdMap<SampleId>,
    pub cohort_ids: IdMap<CohortId>,
    /// Samples defined by each file, in original file header order.
    pub samples_in_files: BTreeMap<FileId, Vec<SampleId>>,
    /// Sample membership of each cohort.
    pub cohorts: BTreeMap<CohortId, BTreeSet<SampleId>>,
    pub indexed_files: BTreeSet<FileId>,
    /// Raw variant-file header text, only for indexed files that carry one.
    pub headers: BTreeMap<FileId, String>,
    pub calculated_stats: BTreeSet<CohortId>,
    pub invalid_stats: BTreeSet<CohortId>,
    pub aggregation: Aggregation,
}

impl StudyMetadata {
    #[must_use]
    pub fn new(study_id: StudyId, study_name: impl Into<String>) -> Self {
        Self {
            study_id,
            study_name: study_name.into(),
            file_ids: IdMap::new(),
            sample_ids: IdMap::new(),
            cohort_ids: IdMap::new(),
            samples_in_files: BTreeMap::new(),
            cohorts: BTreeMap::new(),
            indexed_files: BTreeSet::new(),
            headers: BTreeMap::new(),
            calculated_stats: BTreeSet::new(),
            invalid_stats: BTreeSet::new(),
            aggregation: Aggregation::None,
        }
    }

    /// Replace the sample list of a file, dropping duplicates while keeping
    /// first-occurrence order.
    pub fn set_file_samples(&mut self, file: FileId, samples: impl IntoIterator<Item = SampleId>) {
        let mut seen = BTreeSet::new();
        let ordered = samples
            .into_iter()
            .filter(|sample| seen.insert(*sample))
            .collect();
        self.samples_in_files.insert(file, ordered);
    }

    /// Apply a catalog cohort status to the stats sets.
    ///
    /// `Ready` moves the cohort into `calculated_stats`, `Invalid` into
    /// `invalid_stats`, anything else removes it from both. The two sets
    /// stay disjoint.
    pub fn apply_cohort_status(&mut self, cohort: CohortId, status: CohortStatus) {
        match status {
            CohortStatus::Ready => {
                self.calculated_stats.insert(cohort);
                self.invalid_stats.remove(&cohort);
            }
            CohortStatus::Invalid => {
                self.calculated_stats.remove(&cohort);
                self.invalid_stats.insert(cohort);
            }
            CohortStatus::None | CohortStatus::Calculating => {
                self.calculated_stats.remove(&cohort);
                self.invalid_stats.remove(&cohort);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_samples_keep_header_order_and_dedupe() {
        let mut meta = StudyMetadata::new(StudyId::new(1), "owner@p:s");
        meta.set_file_samples(
            FileId::new(10),
            [3, 1, 2, 1].into_iter().map(SampleId::new),
        );
        let stored = &meta.samples_in_files[&FileId::new(10)];
        assert_eq!(
            stored,
            &vec![SampleId::new(3), SampleId::new(1), SampleId::new(2)]
        );
    }

    #[test]
    fn cohort_status_sets_stay_disjoint() {
        let mut meta = StudyMetadata::new(StudyId::new(1), "owner@p:s");
        let cohort = CohortId::new(5);

        meta.apply_cohort_status(cohort, CohortStatus::Ready);
        assert!(meta.calculated_stats.contains(&cohort));
        assert!(!meta.invalid_stats.contains(&cohort));

        meta.apply_cohort_status(cohort, CohortStatus::Invalid);
        assert!(!meta.calculated_stats.contains(&cohort));
        assert!(meta.invalid_stats.contains(&cohort));

        meta.apply_cohort_status(cohort, CohortStatus::Calculating);
        assert!(!meta.calculated_stats.contains(&cohort));
        assert!(!meta.invalid_stats.contains(&cohort));
    }
}
