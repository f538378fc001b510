// SPDX-License-Identifier: Apache-2.0

use crate::error::GatewayError;
use crate::trace::{AuditSink, TraceRecorder};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use varcat_catalog::{Caller, CatalogBackend, StudyEntry};
use varcat_model::{DataCategory, DataStore, StudyId, StudyMetadata};
use varcat_query::{
    parse_sample_annotation, QueryProjection, ResponseField, SampleInclusion, VariantQuery,
};
use varcat_store::{
    DataResult, DataStoreResolver, EngineRegistry, ResolverConfig, RowStream,
    VariantStorageEngine,
};

/// Sample fields the catalog can constrain directly; anything else in a
/// sample-annotation expression is treated as an annotation predicate.
const RECOGNIZED_SAMPLE_FIELDS: [&str; 4] = ["id", "name", "source", "somatic"];

enum EngineCall<'a> {
    Query,
    Count,
    Distinct(&'a str),
    GroupBy(&'a str),
    Rank {
        field: &'a str,
        limit: usize,
        ascending: bool,
    },
    Facet(&'a str),
}

impl EngineCall<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Count => "count",
            Self::Distinct(_) => "distinct",
            Self::GroupBy(_) => "group_by",
            Self::Rank { .. } => "rank",
            Self::Facet(_) => "facet",
        }
    }
}

/// Datastore resolutions already made while serving one request.
///
/// Resolution is pure given catalog state, so a study is resolved at most
/// once per request no matter how many pipeline steps need it.
#[derive(Default)]
struct RequestContext {
    datastores: BTreeMap<StudyId, DataStore>,
}

/// A query that cleared study resolution, rewriting and visibility
/// enforcement, bound to the engine and database that will execute it.
struct Prepared {
    query: VariantQuery,
    database: String,
    engine: Arc<dyn VariantStorageEngine>,
}

/// The gateway every read path goes through.
///
/// Resolves the query's study scope, rewrites catalog predicates into the
/// engine vocabulary, enforces sample-level visibility and only then
/// delegates to the resolved storage engine. Every operation emits exactly
/// one audit trace, on success and on failure alike.
pub struct SecureQueryGateway {
    catalog: Arc<dyn CatalogBackend>,
    registry: Arc<EngineRegistry>,
    resolver: DataStoreResolver,
    audit: Arc<dyn AuditSink>,
}

impl SecureQueryGateway {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        registry: Arc<EngineRegistry>,
        config: ResolverConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: DataStoreResolver::new(catalog.clone(), config),
            catalog,
            registry,
            audit,
        }
    }

    pub async fn get(
        &self,
        query: VariantQuery,
        projection: QueryProjection,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(query, projection, EngineCall::Query, caller)
            .await
    }

    pub async fn count(
        &self,
        query: VariantQuery,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(query, sampleless_projection(), EngineCall::Count, caller)
            .await
    }

    pub async fn distinct(
        &self,
        query: VariantQuery,
        field: &str,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(
            query,
            sampleless_projection(),
            EngineCall::Distinct(field),
            caller,
        )
        .await
    }

    pub async fn group_by(
        &self,
        query: VariantQuery,
        field: &str,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(
            query,
            sampleless_projection(),
            EngineCall::GroupBy(field),
            caller,
        )
        .await
    }

    pub async fn rank(
        &self,
        query: VariantQuery,
        field: &str,
        limit: usize,
        ascending: bool,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(
            query,
            sampleless_projection(),
            EngineCall::Rank {
                field,
                limit,
                ascending,
            },
            caller,
        )
        .await
    }

    pub async fn facet(
        &self,
        query: VariantQuery,
        facet: &str,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        self.execute(
            query,
            sampleless_projection(),
            EngineCall::Facet(facet),
            caller,
        )
        .await
    }

    /// Open a row iterator running the same resolution, rewriting and
    /// visibility enforcement as [`SecureQueryGateway::get`]. The audit
    /// trace is emitted when the iterator is opened; the row count is not
    /// known at that point.
    pub async fn iterator(
        &self,
        query: VariantQuery,
        projection: QueryProjection,
        caller: &Caller,
    ) -> Result<RowStream, GatewayError> {
        let mut recorder = TraceRecorder::new(
            "iterator",
            serde_json::to_value(&query).unwrap_or(Value::Null),
            serde_json::to_value(&projection).unwrap_or(Value::Null),
        );
        let outcome = self
            .run_iterator(query, &projection, caller, &mut recorder)
            .await;
        let trace = match &outcome {
            Ok(_) => recorder.opened(),
            Err(error) => recorder.failure(error),
        };
        self.audit.record(&trace).await;
        outcome
    }

    /// Read-through export of the storage-side study metadata record.
    pub async fn metadata(
        &self,
        study_ref: &str,
        caller: &Caller,
    ) -> Result<StudyMetadata, GatewayError> {
        let mut recorder =
            TraceRecorder::new("metadata", json!({ "study": study_ref }), Value::Null);
        let outcome = self.run_metadata(study_ref, caller, &mut recorder).await;
        let trace = match &outcome {
            Ok(_) => recorder.success(1),
            Err(error) => recorder.failure(error),
        };
        self.audit.record(&trace).await;
        outcome
    }

    async fn execute(
        &self,
        query: VariantQuery,
        projection: QueryProjection,
        call: EngineCall<'_>,
        caller: &Caller,
    ) -> Result<DataResult, GatewayError> {
        let mut recorder = TraceRecorder::new(
            call.name(),
            serde_json::to_value(&query).unwrap_or(Value::Null),
            serde_json::to_value(&projection).unwrap_or(Value::Null),
        );
        let outcome = self
            .run(query, &projection, &call, caller, &mut recorder)
            .await;
        let trace = match &outcome {
            Ok(result) => recorder.success(result.num_matches),
            Err(error) => recorder.failure(error),
        };
        self.audit.record(&trace).await;
        outcome
    }

    async fn run(
        &self,
        query: VariantQuery,
        projection: &QueryProjection,
        call: &EngineCall<'_>,
        caller: &Caller,
        recorder: &mut TraceRecorder,
    ) -> Result<DataResult, GatewayError> {
        let Prepared {
            query,
            database,
            engine,
        } = self.prepare(query, projection, caller, recorder).await?;

        let storage_started = Instant::now();
        let database = database.as_str();
        let result = match call {
            EngineCall::Query => engine.query(database, &query, projection).await?,
            EngineCall::Count => engine.count(database, &query).await?,
            EngineCall::Distinct(field) => engine.distinct(database, &query, field).await?,
            EngineCall::GroupBy(field) => engine.group_by(database, &query, field).await?,
            EngineCall::Rank {
                field,
                limit,
                ascending,
            } => {
                engine
                    .rank(database, &query, field, *limit, *ascending)
                    .await?
            }
            EngineCall::Facet(facet) => engine.facet(database, &query, facet).await?,
        };
        recorder.add_storage(storage_started.elapsed());
        Ok(result)
    }

    async fn run_iterator(
        &self,
        query: VariantQuery,
        projection: &QueryProjection,
        caller: &Caller,
        recorder: &mut TraceRecorder,
    ) -> Result<RowStream, GatewayError> {
        let Prepared {
            query,
            database,
            engine,
        } = self.prepare(query, projection, caller, recorder).await?;

        let storage_started = Instant::now();
        let rows = engine.iterator(&database, &query, projection).await?;
        recorder.add_storage(storage_started.elapsed());
        Ok(rows)
    }

    /// Steps 1-4 of the pipeline: study resolution, datastore + engine
    /// resolution, query rewriting and sample-visibility enforcement.
    async fn prepare(
        &self,
        mut query: VariantQuery,
        projection: &QueryProjection,
        caller: &Caller,
        recorder: &mut TraceRecorder,
    ) -> Result<Prepared, GatewayError> {
        let mut ctx = RequestContext::default();

        let catalog_started = Instant::now();
        let user = self.catalog.user_id(caller).await?;
        recorder.set_user(&user);
        let studies = self.candidate_studies(&query, caller).await?;
        let head = single_project_head(&studies)?;
        let datastore = self.datastore_for(&mut ctx, head, caller).await?;
        let engine = self.registry.get(&datastore.storage_engine_id)?;
        self.rewrite(&mut query, head, caller).await?;
        recorder.add_catalog(catalog_started.elapsed());

        let permission_started = Instant::now();
        self.enforce_sample_visibility(&mut query, projection, &studies, head, &mut ctx, caller)
            .await?;
        recorder.add_permission(permission_started.elapsed());

        debug!(
            user = %user,
            study = %head.fqn,
            database = %datastore.database_name,
            "query prepared for storage delegation"
        );
        Ok(Prepared {
            query,
            database: datastore.database_name,
            engine,
        })
    }

    async fn run_metadata(
        &self,
        study_ref: &str,
        caller: &Caller,
        recorder: &mut TraceRecorder,
    ) -> Result<StudyMetadata, GatewayError> {
        let catalog_started = Instant::now();
        let user = self.catalog.user_id(caller).await?;
        recorder.set_user(&user);
        let study = self.catalog.resolve_study(study_ref, caller).await?;
        let datastore = self
            .resolver
            .resolve_for_study(&study, DataCategory::Variant, caller)
            .await?;
        let engine = self.registry.get(&datastore.storage_engine_id)?;
        recorder.add_catalog(catalog_started.elapsed());

        let storage_started = Instant::now();
        let metadata = engine
            .get_study_metadata(&datastore.database_name, study.id)
            .await?;
        recorder.add_storage(storage_started.elapsed());
        metadata.ok_or_else(|| {
            GatewayError::not_found(format!("no study metadata for study {}", study.fqn))
        })
    }

    /// Study scope of a query: explicit project, include-study list, study
    /// filter, or every readable study, in that precedence. Sorted by id so
    /// "the first study" is reproducible.
    async fn candidate_studies(
        &self,
        query: &VariantQuery,
        caller: &Caller,
    ) -> Result<Vec<StudyEntry>, GatewayError> {
        let mut studies = if let Some(project) = &query.project {
            self.catalog.studies_of_project(project, caller).await?
        } else if !query.include_study.is_empty() {
            self.resolve_each(&query.include_study, caller).await?
        } else if !query.study.is_empty() {
            self.resolve_each(&query.study, caller).await?
        } else {
            self.catalog.readable_studies(caller).await?
        };
        studies.sort_by_key(|study| study.id);
        studies.dedup_by_key(|study| study.id);
        if studies.is_empty() {
            return Err(GatewayError::not_found("no study resolved for the query"));
        }
        Ok(studies)
    }

    async fn resolve_each(
        &self,
        refs: &[String],
        caller: &Caller,
    ) -> Result<Vec<StudyEntry>, GatewayError> {
        let mut studies = Vec::with_capacity(refs.len());
        for study_ref in refs {
            studies.push(self.catalog.resolve_study(study_ref, caller).await?);
        }
        Ok(studies)
    }

    async fn datastore_for(
        &self,
        ctx: &mut RequestContext,
        study: &StudyEntry,
        caller: &Caller,
    ) -> Result<DataStore, GatewayError> {
        if let Some(datastore) = ctx.datastores.get(&study.id) {
            return Ok(datastore.clone());
        }
        let datastore = self
            .resolver
            .resolve_for_study(study, DataCategory::Variant, caller)
            .await?;
        ctx.datastores.insert(study.id, datastore.clone());
        Ok(datastore)
    }

    /// Rewrite catalog-interpreted predicates into the engine vocabulary.
    ///
    /// Clinical predicates (family, panel) have no rewrite in this core and
    /// are rejected rather than guessed at. A sample-annotation expression
    /// is resolved against the catalog and becomes an explicit sample list.
    async fn rewrite(
        &self,
        query: &mut VariantQuery,
        head: &StudyEntry,
        caller: &Caller,
    ) -> Result<(), GatewayError> {
        if query.family.is_some() || query.panel.is_some() {
            return Err(GatewayError::invalid_state(
                "family and panel predicates have no storage-engine rewrite",
            ));
        }
        if let Some(expression) = query.sample_annotation.take() {
            let sample_query = parse_sample_annotation(&expression, |key| {
                RECOGNIZED_SAMPLE_FIELDS.contains(&key)
            });
            let mut matched = self.catalog.find_samples(head.id, &sample_query, caller).await?;
            matched.sort_by_key(|sample| sample.id);
            if matched.is_empty() {
                query.include_sample = Some(SampleInclusion::None);
            } else {
                for sample in matched {
                    if !query.sample.contains(&sample.name) {
                        query.sample.push(sample.name);
                    }
                }
            }
        }
        Ok(())
    }

    /// The security-critical step: no query that returns sample data may
    /// reach the engine without an explicit include-sample filter, because
    /// an unset include is engine shorthand for "all samples".
    async fn enforce_sample_visibility(
        &self,
        query: &mut VariantQuery,
        projection: &QueryProjection,
        studies: &[StudyEntry],
        head: &StudyEntry,
        ctx: &mut RequestContext,
        caller: &Caller,
    ) -> Result<(), GatewayError> {
        if !projection.returns_sample_data() {
            return Ok(());
        }
        if matches!(query.include_sample, Some(SampleInclusion::None)) {
            return Ok(());
        }

        if query.has_explicit_samples() {
            let requested = query.explicit_samples();
            let unique: BTreeSet<&String> = requested.iter().collect();
            let mut visible = self
                .catalog
                .readable_samples_by_name(head.id, &requested, caller)
                .await?;
            if visible.len() < unique.len() {
                return Err(GatewayError::denied(
                    "caller cannot read every requested sample",
                ));
            }
            visible.sort_by_key(|sample| sample.id);
            query.include_sample = Some(SampleInclusion::Samples(
                visible.into_iter().map(|sample| sample.name).collect(),
            ));
            return Ok(());
        }

        // Default visible set: catalog-readable samples intersected with
        // samples the engine actually knows, per candidate study, in
        // catalog-id order. Samples unknown to the engine are dropped, not
        // an error.
        let mut names: Vec<String> = Vec::new();
        for study in studies {
            let datastore = self.datastore_for(ctx, study, caller).await?;
            let engine = self.registry.get(&datastore.storage_engine_id)?;
            let Some(metadata) = engine
                .get_study_metadata(&datastore.database_name, study.id)
                .await?
            else {
                continue;
            };
            let mut readable = self.catalog.readable_samples(study.id, caller).await?;
            readable.sort_by_key(|sample| sample.id);
            for sample in readable {
                if metadata.sample_ids.contains_id(sample.id) && !names.contains(&sample.name) {
                    names.push(sample.name);
                }
            }
        }
        query.include_sample = Some(if names.is_empty() {
            SampleInclusion::None
        } else {
            SampleInclusion::Samples(names)
        });
        Ok(())
    }
}

/// Aggregate operations never return per-sample data.
fn sampleless_projection() -> QueryProjection {
    QueryProjection::excluding([ResponseField::StudiesSamples])
}

/// Collapse the candidate studies to one, refusing to silently pick a
/// project when the scope spans several.
fn single_project_head(studies: &[StudyEntry]) -> Result<&StudyEntry, GatewayError> {
    let head = studies
        .first()
        .ok_or_else(|| GatewayError::not_found("no study resolved for the query"))?;
    if studies
        .iter()
        .any(|study| study.project_fqn != head.project_fqn)
    {
        let fqns: Vec<&str> = studies.iter().map(|study| study.fqn.as_str()).collect();
        return Err(GatewayError::ambiguous_project(format!(
            "query studies span multiple projects: {}",
            fqns.join(", ")
        )));
    }
    Ok(head)
}
