// SPDX-License-Identifier: Apache-2.0

use crate::engine::{DataResult, RowStream, VariantStorageEngine};
use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::sync::RwLock;
use varcat_model::{StudyId, StudyMetadata};
use varcat_query::{QueryProjection, SampleInclusion, VariantQuery};

#[derive(Default)]
struct DbState {
    metadata: BTreeMap<StudyId, StudyMetadata>,
    variants: Vec<Value>,
}

/// In-memory storage engine.
///
/// Reference implementation of [`VariantStorageEngine`]: rows are flat
/// JSON objects with an optional `samples` object keyed by sample name.
/// The include-sample filter is honored by stripping sample entries, and
/// the "no samples" sentinel removes sample data entirely.
pub struct MemoryVariantEngine {
    id: String,
    inner: RwLock<BTreeMap<String, DbState>>,
}

impl MemoryVariantEngine {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn add_variant(&self, database: &str, row: Value) {
        self.inner
            .write()
            .await
            .entry(database.to_string())
            .or_default()
            .variants
            .push(row);
    }

    async fn matching_rows(&self, database: &str, query: &VariantQuery) -> Vec<Value> {
        let inner = self.inner.read().await;
        let Some(db) = inner.get(database) else {
            return Vec::new();
        };
        db.variants
            .iter()
            .filter(|row| region_matches(row, query))
            .cloned()
            .collect()
    }
}

fn region_matches(row: &Value, query: &VariantQuery) -> bool {
    if query.region.is_empty() {
        return true;
    }
    row.get("region")
        .and_then(Value::as_str)
        .is_some_and(|region| query.region.iter().any(|r| r == region))
}

/// Apply the include-sample filter and the field projection to one row.
fn project_row(mut row: Value, query: &VariantQuery, projection: &QueryProjection) -> Value {
    if !projection.returns_sample_data() {
        if let Some(object) = row.as_object_mut() {
            object.remove("samples");
        }
        return row;
    }
    match &query.include_sample {
        Some(SampleInclusion::None) => {
            if let Some(object) = row.as_object_mut() {
                object.remove("samples");
            }
        }
        Some(SampleInclusion::Samples(names)) => {
            if let Some(samples) = row.get_mut("samples").and_then(Value::as_object_mut) {
                let kept: Map<String, Value> = samples
                    .iter()
                    .filter(|(name, _)| names.contains(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                *samples = kept;
            }
        }
        None => {}
    }
    row
}

fn group_counts(rows: &[Value], field: &str) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        if let Some(value) = row.get(field).and_then(Value::as_str) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[async_trait]
impl VariantStorageEngine for MemoryVariantEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn get_study_metadata(
        &self,
        database: &str,
        study: StudyId,
    ) -> Result<Option<StudyMetadata>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .get(database)
            .and_then(|db| db.metadata.get(&study))
            .cloned())
    }

    async fn put_study_metadata(
        &self,
        database: &str,
        metadata: &StudyMetadata,
    ) -> Result<(), StorageError> {
        self.inner
            .write()
            .await
            .entry(database.to_string())
            .or_default()
            .metadata
            .insert(metadata.study_id, metadata.clone());
        Ok(())
    }

    async fn query(
        &self,
        database: &str,
        query: &VariantQuery,
        projection: &QueryProjection,
    ) -> Result<DataResult, StorageError> {
        let started = Instant::now();
        let rows = self.matching_rows(database, query).await;
        let num_matches = rows.len() as u64;
        let mut results: Vec<Value> = rows
            .into_iter()
            .map(|row| project_row(row, query, projection))
            .collect();
        if let Some(limit) = projection.limit {
            results.truncate(limit);
        }
        Ok(DataResult {
            time_ms: started.elapsed().as_millis() as u64,
            num_matches,
            results,
        })
    }

    async fn iterator(
        &self,
        database: &str,
        query: &VariantQuery,
        projection: &QueryProjection,
    ) -> Result<RowStream, StorageError> {
        let rows = self.matching_rows(database, query).await;
        let query = query.clone();
        let projection = projection.clone();
        Ok(Box::new(
            rows.into_iter()
                .map(move |row| Ok(project_row(row, &query, &projection))),
        ))
    }

    async fn count(
        &self,
        database: &str,
        query: &VariantQuery,
    ) -> Result<DataResult, StorageError> {
        let rows = self.matching_rows(database, query).await;
        Ok(DataResult {
            time_ms: 0,
            num_matches: rows.len() as u64,
            results: vec![json!(rows.len())],
        })
    }

    async fn distinct(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
    ) -> Result<DataResult, StorageError> {
        let rows = self.matching_rows(database, query).await;
        let values: Vec<Value> = group_counts(&rows, field)
            .into_keys()
            .map(Value::from)
            .collect();
        Ok(DataResult::from_rows(values))
    }

    async fn group_by(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
    ) -> Result<DataResult, StorageError> {
        let rows = self.matching_rows(database, query).await;
        let groups: Vec<Value> = group_counts(&rows, field)
            .into_iter()
            .map(|(value, count)| json!({ "value": value, "count": count }))
            .collect();
        Ok(DataResult::from_rows(groups))
    }

    async fn rank(
        &self,
        database: &str,
        query: &VariantQuery,
        field: &str,
        limit: usize,
        ascending: bool,
    ) -> Result<DataResult, StorageError> {
        let rows = self.matching_rows(database, query).await;
        let mut groups: Vec<(String, u64)> = group_counts(&rows, field).into_iter().collect();
        groups.sort_by(|a, b| if ascending { a.1.cmp(&b.1) } else { b.1.cmp(&a.1) });
        groups.truncate(limit);
        let results = groups
            .into_iter()
            .map(|(value, count)| json!({ "value": value, "count": count }))
            .collect();
        Ok(DataResult::from_rows(results))
    }

    async fn facet(
        &self,
        database: &str,
        query: &VariantQuery,
        facet: &str,
    ) -> Result<DataResult, StorageError> {
        let rows = self.matching_rows(database, query).await;
        let buckets: Vec<Value> = group_counts(&rows, facet)
            .into_iter()
            .map(|(value, count)| json!({ "value": value, "count": count }))
            .collect();
        Ok(DataResult::from_rows(vec![json!({
            "field": facet,
            "buckets": buckets,
        })]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn include_sample_filter_strips_other_samples() {
        let engine = MemoryVariantEngine::new("memory");
        engine
            .add_variant(
                "db",
                json!({
                    "id": "1:100:A:T",
                    "region": "chr1",
                    "samples": {"S1": "0/1", "S2": "1/1"},
                }),
            )
            .await;

        let mut query = VariantQuery::new();
        query.include_sample = Some(SampleInclusion::Samples(vec!["S1".to_string()]));
        let result = engine
            .query("db", &query, &QueryProjection::new())
            .await
            .expect("query");
        let samples = result.results[0]
            .get("samples")
            .and_then(Value::as_object)
            .expect("samples object");
        assert!(samples.contains_key("S1"));
        assert!(!samples.contains_key("S2"));
    }

    #[tokio::test]
    async fn no_samples_sentinel_removes_sample_data() {
        let engine = MemoryVariantEngine::new("memory");
        engine
            .add_variant("db", json!({"id": "v", "samples": {"S1": "0/1"}}))
            .await;

        let mut query = VariantQuery::new();
        query.include_sample = Some(SampleInclusion::None);
        let result = engine
            .query("db", &query, &QueryProjection::new())
            .await
            .expect("query");
        assert!(result.results[0].get("samples").is_none());
    }

    #[tokio::test]
    async fn iterator_applies_the_include_sample_filter_per_row() {
        let engine = MemoryVariantEngine::new("memory");
        engine
            .add_variant("db", json!({"id": "v1", "samples": {"S1": "0/1", "S2": "1/1"}}))
            .await;
        engine
            .add_variant("db", json!({"id": "v2", "samples": {"S2": "1/1"}}))
            .await;

        let mut query = VariantQuery::new();
        query.include_sample = Some(SampleInclusion::Samples(vec!["S1".to_string()]));
        let rows = engine
            .iterator("db", &query, &QueryProjection::new())
            .await
            .expect("iterator");
        let rows: Vec<Value> = rows.collect::<Result<_, _>>().expect("rows");
        assert_eq!(rows.len(), 2);
        let samples = rows[0]
            .get("samples")
            .and_then(Value::as_object)
            .expect("samples object");
        assert!(samples.contains_key("S1"));
        assert!(!samples.contains_key("S2"));
    }

    #[tokio::test]
    async fn metadata_round_trip() {
        let engine = MemoryVariantEngine::new("memory");
        let meta = StudyMetadata::new(StudyId::new(1), "owner@p:s");
        engine.put_study_metadata("db", &meta).await.expect("put");
        let loaded = engine
            .get_study_metadata("db", StudyId::new(1))
            .await
            .expect("get");
        assert_eq!(loaded, Some(meta));
    }
}
