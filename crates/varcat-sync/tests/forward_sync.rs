// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;
use varcat_catalog::{Caller, CatalogBackend, CohortEntry, FileEntry, MemoryCatalog, ProjectEntry, SampleEntry, StudyEntry};
use varcat_model::{
    Bioformat, CohortId, CohortStatus, DataStore, FileId, FileIndexStatus, SampleId, StudyId,
};
use varcat_store::{EngineRegistry, MemoryVariantEngine, StudyMetadataStore};
use varcat_sync::{MetadataSynchronizer, SyncConfig};

const STUDY: StudyId = StudyId::new(1);

fn file(id: u32, name: &str, samples: &[u32], status: FileIndexStatus, header: Option<&str>) -> FileEntry {
    FileEntry {
        id: FileId::new(id),
        name: name.to_string(),
        bioformat: Bioformat::Variant,
        samples: samples.iter().copied().map(SampleId::new).collect(),
        index_status: status,
        has_transformed_file: false,
        variant_header: header.map(str::to_string),
    }
}

fn sample(id: u32, name: &str) -> SampleEntry {
    SampleEntry {
        id: SampleId::new(id),
        name: name.to_string(),
        annotations: BTreeMap::new(),
    }
}

fn cohort(id: u32, name: &str, samples: &[u32], status: CohortStatus) -> CohortEntry {
    CohortEntry {
        id: CohortId::new(id),
        name: name.to_string(),
        samples: samples.iter().copied().map(SampleId::new).collect(),
        status,
    }
}

async fn seeded_catalog() -> Arc<MemoryCatalog> {
    let catalog = Arc::new(MemoryCatalog::new());
    catalog.add_user("tok", "ann").await;
    catalog
        .add_project(ProjectEntry {
            fqn: "ann@p1".to_string(),
            alias: "p1".to_string(),
            owner: "ann".to_string(),
            datastores: BTreeMap::new(),
        })
        .await;
    catalog
        .add_study(
            StudyEntry {
                id: STUDY,
                alias: "studyA".to_string(),
                fqn: "ann@p1:studyA".to_string(),
                project_fqn: "ann@p1".to_string(),
                aggregation: None,
                datastores: BTreeMap::new(),
            },
            ["ann".to_string()],
        )
        .await;
    catalog
        .add_file(STUDY, file(1, "f1.vcf", &[1, 2], FileIndexStatus::Ready, Some("##fileformat=VCFv4.2")))
        .await;
    catalog
        .add_file(STUDY, file(2, "f2.vcf", &[2, 3], FileIndexStatus::None, Some("##fileformat=VCFv4.2")))
        .await;
    catalog
        .add_file(
            STUDY,
            FileEntry {
                bioformat: Bioformat::Other,
                ..file(3, "notes.txt", &[], FileIndexStatus::None, None)
            },
        )
        .await;
    for (id, name) in [(1, "S1"), (2, "S2"), (3, "S3")] {
        catalog.add_sample(STUDY, sample(id, name)).await;
    }
    catalog
        .add_cohort(STUDY, cohort(100, "ALL", &[], CohortStatus::None))
        .await;
    catalog
        .add_cohort(STUDY, cohort(101, "cases", &[1, 2], CohortStatus::Ready))
        .await;
    catalog
}

fn store() -> (Arc<MemoryVariantEngine>, StudyMetadataStore) {
    let engine = Arc::new(MemoryVariantEngine::new("memory"));
    let mut registry = EngineRegistry::new();
    registry.register(engine.clone());
    let datastore = DataStore::new("memory", "opencga_ann_p1");
    let store = StudyMetadataStore::open(&registry, &datastore).expect("open store");
    (engine, store)
}

#[tokio::test]
async fn forward_sync_builds_identity_maps_and_status_sets() {
    let catalog = seeded_catalog().await;
    let (_engine, store) = store();
    let sync = MetadataSynchronizer::new(catalog, SyncConfig::default());
    let caller = Caller::new("tok");

    let meta = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("forward sync");

    assert_eq!(meta.study_name, "ann@p1:studyA");
    assert_eq!(meta.file_ids.id_of("f1.vcf"), Some(FileId::new(1)));
    assert_eq!(meta.file_ids.id_of("f2.vcf"), Some(FileId::new(2)));
    // non-variant bioformats are not registered
    assert_eq!(meta.file_ids.id_of("notes.txt"), None);
    assert_eq!(meta.sample_ids.len(), 3);
    assert_eq!(
        meta.samples_in_files[&FileId::new(2)],
        vec![SampleId::new(2), SampleId::new(3)]
    );

    // indexed set seeded from READY files on first sync only
    assert!(meta.indexed_files.contains(&FileId::new(1)));
    assert!(!meta.indexed_files.contains(&FileId::new(2)));

    // headers only for indexed files
    assert!(meta.headers.contains_key(&FileId::new(1)));
    assert!(!meta.headers.contains_key(&FileId::new(2)));

    // default cohort registered without membership
    assert_eq!(meta.cohort_ids.id_of("ALL"), Some(CohortId::new(100)));
    assert!(meta.cohorts[&CohortId::new(100)].is_empty());

    assert!(meta.calculated_stats.contains(&CohortId::new(101)));
    assert!(meta.invalid_stats.is_empty());

    // persisted via the store
    let stored = store.get(STUDY).await.expect("get").expect("present");
    assert_eq!(stored, meta);
}

#[tokio::test]
async fn forward_sync_is_idempotent() {
    let catalog = seeded_catalog().await;
    let (_engine, store) = store();
    let sync = MetadataSynchronizer::new(catalog, SyncConfig::default());
    let caller = Caller::new("tok");

    let first = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("first sync");
    let second = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("second sync");
    assert_eq!(first, second);
}

#[tokio::test]
async fn indexed_files_are_not_reseeded_after_creation() {
    let catalog = seeded_catalog().await;
    let (_engine, store) = store();
    let sync = MetadataSynchronizer::new(catalog.clone(), SyncConfig::default());
    let caller = Caller::new("tok");

    let meta = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("initial sync");
    assert_eq!(meta.indexed_files.len(), 1);

    // Catalog later claims f2 is READY; storage owns the indexed set, so
    // sync must not import it.
    catalog
        .set_file_index_status(
            STUDY,
            FileId::new(2),
            FileIndexStatus::Ready,
            "test",
            &caller,
        )
        .await
        .expect("status update");

    let meta = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("resync");
    assert_eq!(meta.indexed_files.len(), 1);
    assert!(meta.indexed_files.contains(&FileId::new(1)));
    assert!(!meta.headers.contains_key(&FileId::new(2)));
}

#[tokio::test]
async fn cohort_status_transitions_keep_sets_disjoint() {
    let catalog = seeded_catalog().await;
    let (_engine, store) = store();
    let sync = MetadataSynchronizer::new(catalog.clone(), SyncConfig::default());
    let caller = Caller::new("tok");

    sync.sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("initial sync");

    for status in [
        CohortStatus::Invalid,
        CohortStatus::Calculating,
        CohortStatus::Ready,
        CohortStatus::None,
    ] {
        catalog
            .set_cohort_status(STUDY, CohortId::new(101), status, "test", &caller)
            .await
            .expect("status update");
        let meta = sync
            .sync_from_catalog(&store, "studyA", &caller)
            .await
            .expect("resync");
        assert!(meta.calculated_stats.is_disjoint(&meta.invalid_stats));
        let expected_calculated = status == CohortStatus::Ready;
        let expected_invalid = status == CohortStatus::Invalid;
        assert_eq!(
            meta.calculated_stats.contains(&CohortId::new(101)),
            expected_calculated
        );
        assert_eq!(
            meta.invalid_stats.contains(&CohortId::new(101)),
            expected_invalid
        );
    }
}

#[tokio::test]
async fn renaming_a_file_keeps_the_map_bijective() {
    let catalog = seeded_catalog().await;
    let (_engine, store) = store();
    let sync = MetadataSynchronizer::new(catalog.clone(), SyncConfig::default());
    let caller = Caller::new("tok");

    sync.sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("initial sync");

    // Same file id re-registered under a new name.
    catalog
        .add_file(
            STUDY,
            file(2, "f2.renamed.vcf", &[2, 3], FileIndexStatus::None, None),
        )
        .await;

    let meta = sync
        .sync_from_catalog(&store, "studyA", &caller)
        .await
        .expect("resync");
    assert_eq!(meta.file_ids.id_of("f2.renamed.vcf"), Some(FileId::new(2)));
    assert_eq!(meta.file_ids.id_of("f2.vcf"), None);
    assert_eq!(meta.file_ids.name_of(FileId::new(2)), Some("f2.renamed.vcf"));
}
