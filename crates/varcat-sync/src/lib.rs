// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Study metadata synchronization.
//!
//! Reconciles catalog truth into storage-engine study metadata (forward
//! sync) and pushes storage truth back into catalog status fields (reverse
//! sync), both under a per-study exclusive lock.

mod error;
mod lock;
mod synchronizer;

pub use error::{SyncError, SyncErrorCode};
pub use lock::StudyLockRegistry;
pub use synchronizer::{MetadataSynchronizer, SyncConfig};

pub const CRATE_NAME: &str = "varcat-sync";
