// SPDX-License-Identifier: Apache-2.0

use crate::engine::VariantStorageEngine;
use crate::error::StorageError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Explicit string-keyed registry of storage engines.
///
/// Engines register once at startup under their fixed id; lookups by the
/// id stored in a resolved [`varcat_model::DataStore`] select the engine
/// serving a study. The first registered engine becomes the default unless
/// one is named explicitly.
#[derive(Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn VariantStorageEngine>>,
    default_id: Option<String>,
}

impl EngineRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine: Arc<dyn VariantStorageEngine>) {
        let id = engine.id().to_string();
        if self.default_id.is_none() {
            self.default_id = Some(id.clone());
        }
        self.engines.insert(id, engine);
    }

    pub fn get(&self, engine_id: &str) -> Result<Arc<dyn VariantStorageEngine>, StorageError> {
        self.engines.get(engine_id).cloned().ok_or_else(|| {
            StorageError::not_found(format!("storage engine '{engine_id}' is not registered"))
        })
    }

    pub fn default_engine_id(&self) -> Result<&str, StorageError> {
        self.default_id
            .as_deref()
            .ok_or_else(|| StorageError::invalid_state("no storage engine registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_engine::MemoryVariantEngine;

    #[test]
    fn first_registration_becomes_default() {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(MemoryVariantEngine::new("memory")));
        registry.register(Arc::new(MemoryVariantEngine::new("hadoop")));

        assert_eq!(registry.default_engine_id().expect("default"), "memory");
        assert!(registry.get("hadoop").is_ok());
    }

    #[test]
    fn unknown_engine_is_not_found() {
        let registry = EngineRegistry::new();
        let err = registry.get("missing").expect_err("must fail");
        assert_eq!(err.code, crate::StorageErrorCode::NotFound);
    }
}
