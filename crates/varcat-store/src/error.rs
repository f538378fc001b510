// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use varcat_catalog::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorCode {
    NotFound,
    InvalidState,
    Unsupported,
    Upstream,
}

impl StorageErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::Unsupported => "unsupported",
            Self::Upstream => "upstream_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    pub code: StorageErrorCode,
    pub message: String,
}

impl StorageError {
    #[must_use]
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::InvalidState, message)
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<CatalogError> for StorageError {
    fn from(value: CatalogError) -> Self {
        use varcat_catalog::CatalogErrorCode;
        let code = match value.code {
            CatalogErrorCode::NotFound => StorageErrorCode::NotFound,
            CatalogErrorCode::InvalidState => StorageErrorCode::InvalidState,
            CatalogErrorCode::AuthorizationDenied | CatalogErrorCode::Upstream => {
                StorageErrorCode::Upstream
            }
            _ => StorageErrorCode::Upstream,
        };
        Self::new(code, value.message)
    }
}
