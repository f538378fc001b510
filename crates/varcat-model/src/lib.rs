// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Varcat model SSOT.
//!
//! Pure data types shared by the catalog, storage, synchronization and
//! gateway crates: integer identity newtypes, force-put bijective maps,
//! the storage-owned per-study metadata record and the datastore address.

mod bimap;
mod datastore;
mod ids;
mod status;
mod study_metadata;

pub use bimap::IdMap;
pub use datastore::{Bioformat, DataCategory, DataStore};
pub use ids::{CohortId, FileId, SampleId, StudyId};
pub use status::{Aggregation, CohortStatus, FileIndexStatus};
pub use study_metadata::{StudyMetadata, DEFAULT_COHORT};

pub const CRATE_NAME: &str = "varcat-model";
