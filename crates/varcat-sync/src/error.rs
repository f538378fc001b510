// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use varcat_catalog::{CatalogError, CatalogErrorCode};
use varcat_store::{StorageError, StorageErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncErrorCode {
    NotFound,
    AuthorizationDenied,
    InvalidState,
    Upstream,
}

impl SyncErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AuthorizationDenied => "authorization_denied",
            Self::InvalidState => "invalid_state",
            Self::Upstream => "upstream_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    pub code: SyncErrorCode,
    pub message: String,
}

impl SyncError {
    #[must_use]
    pub fn new(code: SyncErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(SyncErrorCode::Upstream, message)
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for SyncError {}

impl From<CatalogError> for SyncError {
    fn from(value: CatalogError) -> Self {
        let code = match value.code {
            CatalogErrorCode::NotFound => SyncErrorCode::NotFound,
            CatalogErrorCode::AuthorizationDenied => SyncErrorCode::AuthorizationDenied,
            CatalogErrorCode::InvalidState => SyncErrorCode::InvalidState,
            _ => SyncErrorCode::Upstream,
        };
        Self::new(code, value.message)
    }
}

impl From<StorageError> for SyncError {
    fn from(value: StorageError) -> Self {
        let code = match value.code {
            StorageErrorCode::NotFound => SyncErrorCode::NotFound,
            StorageErrorCode::InvalidState => SyncErrorCode::InvalidState,
            _ => SyncErrorCode::Upstream,
        };
        Self::new(code, value.message)
    }
}
