// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Catalog-owned index status of a file.
///
/// `Ready` is the only value that qualifies a file for the storage-owned
/// indexed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileIndexStatus {
    #[default]
    None,
    Transforming,
    Transformed,
    Loading,
    Indexing,
    Ready,
}

impl FileIndexStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Transforming => "transforming",
            Self::Transformed => "transformed",
            Self::Loading => "loading",
            Self::Indexing => "indexing",
            Self::Ready => "ready",
        }
    }
}

/// Catalog-owned statistics status of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CohortStatus {
    #[default]
    None,
    Calculating,
    Invalid,
    Ready,
}

impl CohortStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Calculating => "calculating",
            Self::Invalid => "invalid",
            Self::Ready => "ready",
        }
    }
}

/// Whether variant statistics in a study are pre-aggregated, and by which
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    None,
    Basic,
    Evs,
    Exac,
}

impl Aggregation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Evs => "evs",
            Self::Exac => "exac",
        }
    }
}
