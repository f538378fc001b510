// SPDX-License-Identifier: Apache-2.0

use crate::error::StorageError;
use std::env;
use std::sync::Arc;
use tracing::debug;
use varcat_catalog::{Caller, CatalogBackend, StudyEntry};
use varcat_model::{Bioformat, DataCategory, DataStore};

/// Prefix used for computed database names when none is configured.
pub const DEFAULT_DB_PREFIX: &str = "opencga_";

/// Datastore resolution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Prefix for computed database names; normalized to end in `_`.
    pub database_prefix: Option<String>,
    /// Engine id used when no explicit datastore names one.
    pub default_engine_id: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            database_prefix: None,
            default_engine_id: "memory".to_string(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_prefix: env::var("VARCAT_DB_PREFIX").ok().filter(|v| !v.is_empty()),
            default_engine_id: env::var("VARCAT_DEFAULT_ENGINE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_engine_id),
        }
    }
}

/// Compute the default database name: `prefix + owner + '_' + projectAlias`.
///
/// The prefix falls back to [`DEFAULT_DB_PREFIX`] when empty and is forced
/// to end in `_`. The owner has `.` replaced (reserved in the backing
/// stores). The alias has any `owner@` segment stripped and is cut at the
/// first `:` so a full study fqn still yields the project-level name.
#[must_use]
pub fn build_database_name(prefix: Option<&str>, owner: &str, alias: &str) -> String {
    let prefix = match prefix {
        Some(p) if !p.is_empty() => {
            if p.ends_with('_') {
                p.to_string()
            } else {
                format!("{p}_")
            }
        }
        _ => DEFAULT_DB_PREFIX.to_string(),
    };
    let owner = owner.replace('.', "_");
    let alias = alias.split_once('@').map_or(alias, |(_, rest)| rest);
    let alias = alias.split_once(':').map_or(alias, |(project, _)| project);
    format!("{prefix}{owner}_{alias}")
}

/// Maps a study to the physical storage engine and database serving one of
/// its data categories.
///
/// Resolution is pure given catalog state: identical inputs always resolve
/// to the same datastore, so results may be cached for a request lifetime.
pub struct DataStoreResolver {
    catalog: Arc<dyn CatalogBackend>,
    config: ResolverConfig,
}

impl DataStoreResolver {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogBackend>, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }

    /// Category backing a bioformat, or `InvalidState` when the bioformat
    /// has no datastore category.
    pub fn category_for_bioformat(bioformat: Bioformat) -> Result<DataCategory, StorageError> {
        DataCategory::for_bioformat(bioformat).ok_or_else(|| {
            StorageError::invalid_state(format!("bioformat {bioformat:?} has no datastore category"))
        })
    }

    pub async fn resolve(
        &self,
        study_ref: &str,
        category: DataCategory,
        caller: &Caller,
    ) -> Result<DataStore, StorageError> {
        let study = self.catalog.resolve_study(study_ref, caller).await?;
        self.resolve_for_study(&study, category, caller).await
    }

    /// Three-level fallback: study override, project override, computed
    /// default.
    pub async fn resolve_for_study(
        &self,
        study: &StudyEntry,
        category: DataCategory,
        caller: &Caller,
    ) -> Result<DataStore, StorageError> {
        let datastore = if let Some(datastore) = study.datastores.get(&category) {
            datastore.clone()
        } else {
            let project = self.catalog.get_project(&study.project_fqn, caller).await?;
            match project.datastores.get(&category) {
                Some(datastore) => datastore.clone(),
                None => DataStore::new(
                    self.config.default_engine_id.clone(),
                    build_database_name(
                        self.config.database_prefix.as_deref(),
                        &project.owner,
                        &project.alias,
                    ),
                ),
            }
        };
        debug!(study = %study.fqn, category = %category, datastore = %datastore, "resolved datastore");
        Ok(datastore)
    }
}
