// SPDX-License-Identifier: Apache-2.0

use crate::error::SyncError;
use crate::lock::StudyLockRegistry;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use varcat_catalog::{Caller, CatalogBackend, ProjectEntry, StudyEntry};
use varcat_model::{
    Aggregation, CohortStatus, DataCategory, FileIndexStatus, StudyMetadata, DEFAULT_COHORT,
};
use varcat_store::StudyMetadataStore;

/// Synchronizer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Bound on waiting for the per-study lock.
    pub lock_wait: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let lock_wait = env::var("VARCAT_SYNC_LOCK_WAIT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.lock_wait, Duration::from_millis);
        Self { lock_wait }
    }
}

/// Reconciles catalog state with storage-engine study metadata.
///
/// Forward sync rebuilds identity maps and status sets from catalog truth;
/// reverse sync pushes storage-owned truth (indexed files, computed stats)
/// into catalog status fields. Both run under the per-study lock and both
/// leave no partial writes behind: the forward merge happens in memory
/// with a single final `put`, the reverse pushes are each conditional and
/// atomic per entity.
pub struct MetadataSynchronizer {
    catalog: Arc<dyn CatalogBackend>,
    locks: StudyLockRegistry,
    config: SyncConfig,
}

impl MetadataSynchronizer {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogBackend>, config: SyncConfig) -> Self {
        Self {
            catalog,
            locks: StudyLockRegistry::new(),
            config,
        }
    }

    /// Forward sync: catalog -> storage metadata.
    pub async fn sync_from_catalog(
        &self,
        store: &StudyMetadataStore,
        study_ref: &str,
        caller: &Caller,
    ) -> Result<StudyMetadata, SyncError> {
        let study = self.catalog.resolve_study(study_ref, caller).await?;
        let _guard = self.locks.acquire(study.id, self.config.lock_wait).await?;

        let merged = self.build_metadata(store, &study, caller).await?;
        store.put(&merged).await?;
        info!(study = %study.fqn, "study metadata synchronized from catalog");
        Ok(merged)
    }

    /// Reverse sync: storage metadata -> catalog status fields.
    ///
    /// Never touches identity maps; every update is conditional on the
    /// catalog value actually differing.
    pub async fn sync_to_catalog(
        &self,
        store: &StudyMetadataStore,
        study_ref: &str,
        caller: &Caller,
    ) -> Result<(), SyncError> {
        let study = self.catalog.resolve_study(study_ref, caller).await?;
        let _guard = self.locks.acquire(study.id, self.config.lock_wait).await?;

        let metadata = store.get(study.id).await?.ok_or_else(|| {
            SyncError::not_found(format!("no study metadata for study {}", study.fqn))
        })?;

        for cohort in self.catalog.cohorts(study.id, caller).await? {
            if metadata.calculated_stats.contains(&cohort.id) {
                if cohort.status != CohortStatus::Ready {
                    self.catalog
                        .set_cohort_status(
                            study.id,
                            cohort.id,
                            CohortStatus::Ready,
                            "statistics computed by storage",
                            caller,
                        )
                        .await?;
                }
            } else if metadata.invalid_stats.contains(&cohort.id)
                && cohort.status != CohortStatus::Invalid
            {
                self.catalog
                    .set_cohort_status(
                        study.id,
                        cohort.id,
                        CohortStatus::Invalid,
                        "statistics invalidated by storage",
                        caller,
                    )
                    .await?;
            }
        }

        for file in self.catalog.files(study.id, caller).await? {
            if metadata.indexed_files.contains(&file.id) {
                if file.index_status != FileIndexStatus::Ready {
                    self.catalog
                        .set_file_index_status(
                            study.id,
                            file.id,
                            FileIndexStatus::Ready,
                            "indexed by storage",
                            caller,
                        )
                        .await?;
                }
            } else if file.index_status == FileIndexStatus::Ready {
                // Catalog says READY but storage no longer lists the file
                // as indexed; demote.
                let demoted = if file.has_transformed_file {
                    FileIndexStatus::Transformed
                } else {
                    FileIndexStatus::None
                };
                self.catalog
                    .set_file_index_status(
                        study.id,
                        file.id,
                        demoted,
                        "not indexed, regarding study metadata",
                        caller,
                    )
                    .await?;
            }
        }

        info!(study = %study.fqn, "catalog statuses synchronized from storage");
        Ok(())
    }

    /// Build the merged metadata record in memory. No external writes.
    async fn build_metadata(
        &self,
        store: &StudyMetadataStore,
        study: &StudyEntry,
        caller: &Caller,
    ) -> Result<StudyMetadata, SyncError> {
        let existing = store.get(study.id).await?;
        let is_new = existing.is_none();
        let mut metadata =
            existing.unwrap_or_else(|| StudyMetadata::new(study.id, String::new()));
        metadata.study_id = study.id;

        let project = self.catalog.get_project(&study.project_fqn, caller).await?;
        metadata.study_name = compose_study_name(&project, study);
        metadata.aggregation = study.aggregation.unwrap_or(Aggregation::None);
        debug!(
            study = %study.fqn,
            aggregation = metadata.aggregation.as_str(),
            new = is_new,
            "merging study metadata"
        );

        let files = self.catalog.files(study.id, caller).await?;

        // The indexed set is write-owned by storage. It is seeded from
        // catalog READY files only when the record did not exist yet.
        if is_new {
            for file in &files {
                if file.index_status == FileIndexStatus::Ready {
                    metadata.indexed_files.insert(file.id);
                }
            }
        }

        for file in &files {
            if DataCategory::for_bioformat(file.bioformat).is_none() {
                continue;
            }
            metadata.file_ids.force_put(&file.name, file.id);
            metadata.set_file_samples(file.id, file.samples.iter().copied());
            if metadata.indexed_files.contains(&file.id) {
                if let Some(header) = &file.variant_header {
                    metadata.headers.insert(file.id, header.clone());
                }
            }
        }

        for sample in self.catalog.samples(study.id, caller).await? {
            metadata.sample_ids.force_put(&sample.name, sample.id);
        }

        for cohort in self.catalog.cohorts(study.id, caller).await? {
            metadata.cohort_ids.force_put(&cohort.name, cohort.id);
            if cohort.name == DEFAULT_COHORT {
                // Membership of the default cohort is managed by storage;
                // only the id is registered.
                metadata.cohorts.entry(cohort.id).or_default();
            } else {
                metadata
                    .cohorts
                    .insert(cohort.id, cohort.samples.iter().copied().collect());
            }
            metadata.apply_cohort_status(cohort.id, cohort.status);
        }

        Ok(metadata)
    }
}

/// `owner@projectAlias:studyAlias`, reusing the project alias verbatim
/// when it already carries the owner.
fn compose_study_name(project: &ProjectEntry, study: &StudyEntry) -> String {
    if project.alias.contains('@') {
        format!("{}:{}", project.alias, study.alias)
    } else {
        format!("{}@{}:{}", project.owner, project.alias, study.alias)
    }
}
