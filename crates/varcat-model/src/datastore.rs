// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Biological format of a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bioformat {
    Variant,
    Alignment,
    Coverage,
    Other,
}

/// Data category a physical datastore serves. Only variant and alignment
/// data are mapped to datastores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Variant,
    Alignment,
}

impl DataCategory {
    /// Category backing a bioformat, if any.
    #[must_use]
    pub const fn for_bioformat(bioformat: Bioformat) -> Option<Self> {
        match bioformat {
            Bioformat::Variant => Some(Self::Variant),
            Bioformat::Alignment => Some(Self::Alignment),
            Bioformat::Coverage | Bioformat::Other => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Variant => "variant",
            Self::Alignment => "alignment",
        }
    }
}

impl Display for DataCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical location of a study's data: which storage engine serves it and
/// under which database name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataStore {
    pub storage_engine_id: String,
    pub database_name: String,
}

impl DataStore {
    #[must_use]
    pub fn new(storage_engine_id: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            storage_engine_id: storage_engine_id.into(),
            database_name: database_name.into(),
        }
    }
}

impl Display for DataStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.storage_engine_id, self.database_name)
    }
}
