// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use varcat_catalog::{CatalogError, CatalogErrorCode};
use varcat_store::{StorageError, StorageErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    NotFound,
    AmbiguousProject,
    AuthorizationDenied,
    InvalidState,
    Upstream,
}

impl GatewayErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AmbiguousProject => "ambiguous_project",
            Self::AuthorizationDenied => "authorization_denied",
            Self::InvalidState => "invalid_state",
            Self::Upstream => "upstream_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
}

impl GatewayError {
    #[must_use]
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn ambiguous_project(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AmbiguousProject, message)
    }

    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthorizationDenied, message)
    }

    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidState, message)
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<CatalogError> for GatewayError {
    fn from(value: CatalogError) -> Self {
        let code = match value.code {
            CatalogErrorCode::NotFound => GatewayErrorCode::NotFound,
            CatalogErrorCode::AuthorizationDenied => GatewayErrorCode::AuthorizationDenied,
            CatalogErrorCode::InvalidState => GatewayErrorCode::InvalidState,
            _ => GatewayErrorCode::Upstream,
        };
        Self::new(code, value.message)
    }
}

impl From<StorageError> for GatewayError {
    fn from(value: StorageError) -> Self {
        let code = match value.code {
            StorageErrorCode::NotFound => GatewayErrorCode::NotFound,
            StorageErrorCode::InvalidState | StorageErrorCode::Unsupported => {
                GatewayErrorCode::InvalidState
            }
            _ => GatewayErrorCode::Upstream,
        };
        Self::new(code, value.message)
    }
}
