// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogErrorCode {
    NotFound,
    AuthorizationDenied,
    InvalidState,
    Upstream,
}

impl CatalogErrorCode {
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
pub struct CatalogError {
    pub code: CatalogErrorCode,
    pub message: String,
}

impl CatalogError {
    #[must_use]
    pub fn new(code: CatalogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CatalogErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(CatalogErrorCode::AuthorizationDenied, message)
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CatalogError {}
