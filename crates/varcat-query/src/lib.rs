// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Query vocabulary interpreted by the secure query gateway.
//!
//! Only the parts of the variant query language that drive study and sample
//! scoping live here; everything else travels opaquely to the storage
//! engine through [`VariantQuery::extra`].

mod annotation;
mod projection;
mod query;

pub use annotation::{parse_sample_annotation, SampleQuery, ANNOTATION_PREFIX};
pub use projection::{QueryProjection, ResponseField};
pub use query::{SampleInclusion, VariantQuery};

pub const CRATE_NAME: &str = "varcat-query";
