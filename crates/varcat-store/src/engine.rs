// SPDX-License-Identifier: Apache-2.0

use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use varcat_model::{StudyId, StudyMetadata};
use varcat_query::{QueryProjection, VariantQuery};

/// Result page returned by every engine read operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataResult {
    /// Engine-side execution time.
    pub time_ms: u64,
    /// Total matches, independent of paging.
    pub num_matches: u64,
    pub results: Vec<Value>,
}

impl DataResult {
    #[must_use]
    pub fn from_rows(results: Vec<Value>) -> Self {
        Self {
            time_ms: 0,
            num_matches: results.len() as u64,
            results,
        }
    }
}

/// Stream of rows opened by [`VariantStorageEngine::iterator`].
///
/// Engines may yield rows lazily; per-row failures surface as `Err` items
/// instead of aborting the stream up front.
pub type RowStream = Box<dyn Iterator<Item = Result<Value, StorageError>> + Send>;

/// A pluggable variant storage engine.
///
/// One engine instance serves many databases; every call is addressed by
/// database name. Study metadata persistence is part of the engine because
/// the engine owns which files are actually indexed and which statistics
/// are actually computed.
#[async_trait]
pub trait VariantStorageEngine: Send + Sync {
    /// Registry key of this engine.
    fn id(&self) -> &str;

    async fn get_study_metadata(
        &self,
        database: &str,
        study: StudyId,
    ) -> Result<Option<StudyMetadata>, StorageError>;

    async fn put_study_metadata(
        &self,
        database: &str,
        metadata: &StudyMetadata,
    ) -> Result<(), StorageError>;

    async fn query(
        &self,
        database: &str,
        query: &VariantQuery,
        projection: &QueryProjection,
    ) -> Result<DataResult, StorageError>;

    /// Open a row iterator over the matching variants. The projection's
    /// include-sample filter applies to every yielded row, exactly as it
    /// does for [`VariantStorageEngine::query`].
    async fn iterator(
        &self,
        database: &str,
        query: &VariantQuery,
        projection: &QueryProjection,
    ) -> Result<RowStream, StorageError>;

    async fn count(&self, database: &str, query: &VariantQuery) -> Result<DataResult, StorageError>;

    async fn distinct(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
    ) -> Result<DataResult, StorageError>;

    async fn group_by(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
    ) -> Result<DataResult, StorageError>;

    async fn rank(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
        limit: usize,
        ascending: bool,
    ) -> Result<DataResult, StorageError>;

    async fn facet(
        &self,
        database: &str,
        query: &VariantQuery,
        facet: &str,
    ) -> Result<DataResult, StorageError>;
}

impl std::fmt::Debug for dyn VariantStorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantStorageEngine")
            .field("id", &self.id())
            .finish()
    }
}
