// SPDX-License-Identifier: Apache-2.0

use crate::backend::CatalogBackend;
use crate::entries::{Caller, CohortEntry, FileEntry, ProjectEntry, SampleEntry, StudyEntry};
use crate::error::CatalogError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::debug;
use varcat_model::{CohortId, CohortStatus, FileId, FileIndexStatus, SampleId, StudyId};
use varcat_query::{SampleQuery, ANNOTATION_PREFIX};

struct SampleRecord {
    entry: SampleEntry,
    /// Per-sample reader ACL. `None` inherits the study ACL.
    acl: Option<BTreeSet<String>>,
}

struct StudyRecord {
    entry: StudyEntry,
    readers: BTreeSet<String>,
    files: BTreeMap<FileId, FileEntry>,
    samples: BTreeMap<SampleId, SampleRecord>,
    cohorts: BTreeMap<CohortId, CohortEntry>,
}

#[derive(Default)]
struct Inner {
    tokens: BTreeMap<String, String>,
    projects: BTreeMap<String, ProjectEntry>,
    studies: BTreeMap<StudyId, StudyRecord>,
}

/// In-memory catalog backend.
///
/// Holds the full entity graph behind one `RwLock`; good enough for tests
/// and single-node setups, and the reference for how ACL filtering is
/// expected to behave.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<Inner>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, token: impl Into<String>, user: impl Into<String>) {
        self.inner
            .write()
            .await
            .tokens
            .insert(token.into(), user.into());
    }

    pub async fn add_project(&self, project: ProjectEntry) {
        self.inner
            .write()
            .await
            .projects
            .insert(project.fqn.clone(), project);
    }

    pub async fn add_study(&self, study: StudyEntry, readers: impl IntoIterator<Item = String>) {
        self.inner.write().await.studies.insert(
            study.id,
            StudyRecord {
                entry: study,
                readers: readers.into_iter().collect(),
                files: BTreeMap::new(),
                samples: BTreeMap::new(),
                cohorts: BTreeMap::new(),
            },
        );
    }

    pub async fn add_file(&self, study: StudyId, file: FileEntry) {
        if let Some(record) = self.inner.write().await.studies.get_mut(&study) {
            record.files.insert(file.id, file);
        }
    }

    pub async fn add_sample(&self, study: StudyId, sample: SampleEntry) {
        if let Some(record) = self.inner.write().await.studies.get_mut(&study) {
            record.samples.insert(
                sample.id,
                SampleRecord {
                    entry: sample,
                    acl: None,
                },
            );
        }
    }

    /// Restrict a sample to an explicit reader list, overriding the study
    /// ACL for that sample.
    pub async fn restrict_sample(
        &self,
        study: StudyId,
        sample: SampleId,
        readers: impl IntoIterator<Item = String>,
    ) {
        if let Some(record) = self.inner.write().await.studies.get_mut(&study) {
            if let Some(sample) = record.samples.get_mut(&sample) {
                sample.acl = Some(readers.into_iter().collect());
            }
        }
    }

    pub async fn add_cohort(&self, study: StudyId, cohort: CohortEntry) {
        if let Some(record) = self.inner.write().await.studies.get_mut(&study) {
            record.cohorts.insert(cohort.id, cohort);
        }
    }

    pub async fn cohort_status(&self, study: StudyId, cohort: CohortId) -> Option<CohortStatus> {
        self.inner
            .read()
            .await
            .studies
            .get(&study)
            .and_then(|record| record.cohorts.get(&cohort))
            .map(|cohort| cohort.status)
    }

    pub async fn file_index_status(&self, study: StudyId, file: FileId) -> Option<FileIndexStatus> {
        self.inner
            .read()
            .await
            .studies
            .get(&study)
            .and_then(|record| record.files.get(&file))
            .map(|file| file.index_status)
    }
}

impl Inner {
    fn user_of(&self, caller: &Caller) -> Result<String, CatalogError> {
        self.tokens
            .get(caller.token())
            .cloned()
            .ok_or_else(|| CatalogError::denied("invalid session token"))
    }

    fn readable_study(&self, study: StudyId, user: &str) -> Result<&StudyRecord, CatalogError> {
        let record = self
            .studies
            .get(&study)
            .ok_or_else(|| CatalogError::not_found(format!("study {study} not found")))?;
        if !record.readers.contains(user) {
            return Err(CatalogError::not_found(format!("study {study} not found")));
        }
        Ok(record)
    }

    fn sample_readable(&self, record: &SampleRecord, user: &str) -> bool {
        match &record.acl {
            Some(acl) => acl.contains(user),
            None => true,
        }
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn user_id(&self, caller: &Caller) -> Result<String, CatalogError> {
        self.inner.read().await.user_of(caller)
    }

    async fn resolve_study(
        &self,
        study_ref: &str,
        caller: &Caller,
    ) -> Result<StudyEntry, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        inner
            .studies
            .values()
            .filter(|record| record.readers.contains(&user))
            .find(|record| {
                record.entry.fqn == study_ref
                    || record.entry.alias == study_ref
                    || record.entry.id.to_string() == study_ref
            })
            .map(|record| record.entry.clone())
            .ok_or_else(|| CatalogError::not_found(format!("study '{study_ref}' not found")))
    }

    async fn get_project(
        &self,
        project_fqn: &str,
        caller: &Caller,
    ) -> Result<ProjectEntry, CatalogError> {
        let inner = self.inner.read().await;
        inner.user_of(caller)?;
        inner
            .projects
            .get(project_fqn)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("project '{project_fqn}' not found")))
    }

    async fn studies_of_project(
        &self,
        project_ref: &str,
        caller: &Caller,
    ) -> Result<Vec<StudyEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let project = inner
            .projects
            .values()
            .find(|project| project.fqn == project_ref || project.alias == project_ref)
            .ok_or_else(|| CatalogError::not_found(format!("project '{project_ref}' not found")))?;
        Ok(inner
            .studies
            .values()
            .filter(|record| {
                record.entry.project_fqn == project.fqn && record.readers.contains(&user)
            })
            .map(|record| record.entry.clone())
            .collect())
    }

    async fn readable_studies(&self, caller: &Caller) -> Result<Vec<StudyEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        Ok(inner
            .studies
            .values()
            .filter(|record| record.readers.contains(&user))
            .map(|record| record.entry.clone())
            .collect())
    }

    async fn files(&self, study: StudyId, caller: &Caller) -> Result<Vec<FileEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record.files.values().cloned().collect())
    }

    async fn samples(
        &self,
        study: StudyId,
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record
            .samples
            .values()
            .map(|sample| sample.entry.clone())
            .collect())
    }

    async fn cohorts(
        &self,
        study: StudyId,
        caller: &Caller,
    ) -> Result<Vec<CohortEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record.cohorts.values().cloned().collect())
    }

    async fn readable_samples(
        &self,
        study: StudyId,
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record
            .samples
            .values()
            .filter(|sample| inner.sample_readable(sample, &user))
            .map(|sample| sample.entry.clone())
            .collect())
    }

    async fn readable_samples_by_name(
        &self,
        study: StudyId,
        names: &[String],
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record
            .samples
            .values()
            .filter(|sample| names.contains(&sample.entry.name))
            .filter(|sample| inner.sample_readable(sample, &user))
            .map(|sample| sample.entry.clone())
            .collect())
    }

    async fn find_samples(
        &self,
        study: StudyId,
        query: &SampleQuery,
        caller: &Caller,
    ) -> Result<Vec<SampleEntry>, CatalogError> {
        let inner = self.inner.read().await;
        let user = inner.user_of(caller)?;
        let record = inner.readable_study(study, &user)?;
        Ok(record
            .samples
            .values()
            .filter(|sample| inner.sample_readable(sample, &user))
            .filter(|sample| sample_matches(&sample.entry, query))
            .map(|sample| sample.entry.clone())
            .collect())
    }

    async fn set_cohort_status(
        &self,
        study: StudyId,
        cohort: CohortId,
        status: CohortStatus,
        message: &str,
        caller: &Caller,
    ) -> Result<(), CatalogError> {
        let mut inner = self.inner.write().await;
        let user = inner.user_of(caller)?;
        inner.readable_study(study, &user)?;
        let record = inner
            .studies
            .get_mut(&study)
            .ok_or_else(|| CatalogError::not_found(format!("study {study} not found")))?;
        let cohort = record
            .cohorts
            .get_mut(&cohort)
            .ok_or_else(|| CatalogError::not_found(format!("cohort {cohort} not found")))?;
        debug!(
            cohort = %cohort.name,
            from = cohort.status.as_str(),
            to = status.as_str(),
            message,
            "cohort status change"
        );
        cohort.status = status;
        Ok(())
    }

    async fn set_file_index_status(
        &self,
        study: StudyId,
        file: FileId,
        status: FileIndexStatus,
        message: &str,
        caller: &Caller,
    ) -> Result<(), CatalogError> {
        let mut inner = self.inner.write().await;
        let user = inner.user_of(caller)?;
        inner.readable_study(study, &user)?;
        let record = inner
            .studies
            .get_mut(&study)
            .ok_or_else(|| CatalogError::not_found(format!("study {study} not found")))?;
        let file = record
            .files
            .get_mut(&file)
            .ok_or_else(|| CatalogError::not_found(format!("file {file} not found")))?;
        debug!(
            file = %file.name,
            from = file.index_status.as_str(),
            to = status.as_str(),
            message,
            "file index status change"
        );
        file.index_status = status;
        Ok(())
    }
}

fn sample_matches(sample: &SampleEntry, query: &SampleQuery) -> bool {
    for (key, constraint) in &query.fields {
        if !annotation_holds(sample, key, constraint) {
            return false;
        }
    }
    for predicate in &query.annotations {
        let Some((key, constraint)) = split_predicate(predicate) else {
            return false;
        };
        let key = key
            .strip_prefix(&format!("{ANNOTATION_PREFIX}."))
            .unwrap_or(key);
        if !annotation_holds(sample, key, constraint) {
            return false;
        }
    }
    true
}

fn annotation_holds(sample: &SampleEntry, key: &str, constraint: &str) -> bool {
    let Some(actual) = sample.annotations.get(key) else {
        return false;
    };
    let (operator, expected) = split_operator(constraint);
    match operator {
        "=" | "==" => values_equal(actual, expected),
        "!=" => !values_equal(actual, expected),
        "<" | "<=" | ">" | ">=" => numeric_compare(actual, expected, operator),
        "~" | "=~" => Regex::new(expected).is_ok_and(|re| re.is_match(actual)),
        _ => false,
    }
}

/// Split a `"<op><value>"` constraint, longest operators first.
fn split_operator(constraint: &str) -> (&str, &str) {
    for operator in ["<=", ">=", "!=", "=~", "==", "<", ">", "~", "="] {
        if let Some(value) = constraint.strip_prefix(operator) {
            return (operator, value);
        }
    }
    ("=", constraint)
}

/// Split a `key<op>value` predicate into the key and the `<op>value` rest.
fn split_predicate(predicate: &str) -> Option<(&str, &str)> {
    let at = predicate.find(['<', '>', '!', '~', '='])?;
    let (key, rest) = predicate.split_at(at);
    if key.is_empty() || rest.is_empty() {
        return None;
    }
    Some((key, rest))
}

fn values_equal(actual: &str, expected: &str) -> bool {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => actual == expected,
    }
}

fn numeric_compare(actual: &str, expected: &str, operator: &str) -> bool {
    let (Ok(a), Ok(b)) = (actual.parse::<f64>(), expected.parse::<f64>()) else {
        return false;
    };
    match operator {
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        ">=" => a >= b,
        _ => false,
    }
}
