// SPDX-License-Identifier: Apache-2.0

use crate::entries::{Caller, CohortEntry, FileEntry, ProjectEntry, SampleEntry, StudyEntry};
use crate::error::CatalogError;
use async_trait::async_trait;
use varcat_model::{CohortId, CohortStatus, FileId, FileIndexStatus, StudyId};
use varcat_query::SampleQuery;

/// Async port to the catalog collaborator.
///
/// Listing operations are ACL-filtered: they only return entities the
/// caller may read. Status updates are the reverse-sync write surface and
/// must be conditional on the caller's write access.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Resolve a session token to a user id.
    async fn user_id(&self, caller: &Caller) -> Result<String, CatalogError>;

    /// Resolve a study reference (fqn, alias or numeric id) to exactly one
    /// study readable by the caller.
    async fn resolve_study(&self, study_ref: &str, caller: &Caller)
        -> Result<StudyEntry, CatalogError>;

    async fn get_project(&self, project_fqn: &str, caller: &Caller)
        -> Result<ProjectEntry, CatalogError>;

    /// Studies of a project the caller may read.
    async fn studies_of_project(
        &self,
        project_ref: &str,
        caller: &Caller,
    ) -> Result<Vec<StudyEntry>, CatalogError>;

    /// Every study the caller may read, across all projects.
    async fn readable_studies(&self, caller: &Caller) -> Result<Vec<StudyEntry>, CatalogError>;

    async fn files(&self, study: StudyId, caller: &Caller) -> Result<Vec<FileEntry>, CatalogError>;

    async fn samples(&self, study: StudyId, caller: &Caller)
        -> Result<Vec<SampleEntry>, CatalogError>;

    async fn cohorts(&self, study: StudyId, caller: &Caller)
        -> Result<Vec<CohortEntry>, CatalogError>;

    /// Samples of a study the caller may read, under per-sample ACLs.
    async fn readable_samples(
        &self,
        study: StudyId,
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError>;

    /// Subset of the named samples the caller may read. May return fewer
    /// entries than names requested; it is the caller's job to treat that
    /// as an authorization failure when it matters.
    async fn readable_samples_by_name(
        &self,
        study: StudyId,
        names: &[String],
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError>;

    /// Samples matching a parsed annotation query, ACL-filtered.
    async fn find_samples(
        &self,
        study: StudyId,
        query: &SampleQuery,
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError>;

    async fn set_cohort_status(
        &self,
        study: StudyId,
        cohort: CohortId,
        status: CohortStatus,
        message: &str,
        caller: &Caller,
    ) -> Result<(), CatalogError>;

    async fn set_file_index_status(
        &self,
        study: StudyId,
        file: FileId,
        status: FileIndexStatus,
        message: &str,
        caller: &Caller,
    ) -> Result<(), CatalogError>;
}
