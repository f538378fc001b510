// SPDX-License-Identifier: Apache-2.0

use crate::engine::VariantStorageEngine;
use crate::error::StorageError;
use crate::registry::EngineRegistry;
use std::sync::Arc;
use varcat_model::{DataStore, StudyId, StudyMetadata};

/// Handle to one study-metadata namespace: an engine plus the database
/// name a study resolved to. Pure delegation; merging rules live in the
/// synchronizer.
#[derive(Clone)]
pub struct StudyMetadataStore {
    engine: Arc<dyn VariantStorageEngine>,
    database_name: String,
}

impl StudyMetadataStore {
    #[must_use]
    pub fn new(engine: Arc<dyn VariantStorageEngine>, database_name: impl Into<String>) -> Self {
        Self {
            engine,
            database_name: database_name.into(),
        }
    }

    /// Open the store a resolved datastore points at.
    pub fn open(registry: &EngineRegistry, datastore: &DataStore) -> Result<Self, StorageError> {
        let engine = registry.get(&datastore.storage_engine_id)?;
        Ok(Self::new(engine, datastore.database_name.clone()))
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<dyn VariantStorageEngine> {
        &self.engine
    }

    pub async fn get(&self, study: StudyId) -> Result<Option<StudyMetadata>, StorageError> {
        self.engine
            .get_study_metadata(&self.database_name, study)
            .await
    }

    pub async fn put(&self, metadata: &StudyMetadata) -> Result<(), StorageError> {
        self.engine
            .put_study_metadata(&self.database_name, metadata)
            .await
    }
}
