// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Storage engine collaborator surface.
//!
//! Defines the async trait every variant storage engine implements, the
//! string-keyed engine registry, the per-study metadata store handle and
//! the datastore resolution algorithm, plus an in-memory engine used by
//! tests and as the default registration.

mod engine;
mod error;
mod memory_engine;
mod metadata_store;
mod registry;
mod resolver;

pub use engine::{DataResult, RowStream, VariantStorageEngine};
pub use error::{StorageError, StorageErrorCode};
pub use memory_engine::MemoryVariantEngine;
pub use metadata_store::StudyMetadataStore;
pub use registry::EngineRegistry;
pub use resolver::{build_database_name, DataStoreResolver, ResolverConfig, DEFAULT_DB_PREFIX};

pub const CRATE_NAME: &str = "varcat-store";
