// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Catalog collaborator surface.
//!
//! The catalog is the metadata store of record for projects, studies,
//! files, samples, cohorts and permissions. This crate defines the typed
//! views and the async port the rest of the platform talks through, plus an
//! in-memory backend used by tests and single-node setups.

mod backend;
mod entries;
mod error;
mod memory;

pub use backend::CatalogBackend;
pub use entries::{Caller, CohortEntry, FileEntry, ProjectEntry, SampleEntry, StudyEntry};
pub use error::{CatalogError, CatalogErrorCode};
pub use memory::MemoryCatalog;

pub const CRATE_NAME: &str = "varcat-catalog";
