// SPDX-License-Identifier: Apache-2.0

use crate::error::SyncError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use varcat_model::StudyId;

/// Named per-study mutual exclusion.
///
/// `acquire` returns an owned guard; dropping the guard releases the lock
/// on every exit path, including early returns and panics. Locks are keyed
/// by study id only, so syncs of different studies proceed in parallel.
#[derive(Default)]
pub struct StudyLockRegistry {
    inner: Mutex<HashMap<StudyId, Arc<Mutex<()>>>>,
}

impl StudyLockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a study, waiting at most `wait`.
    pub async fn acquire(
        &self,
        study: StudyId,
        wait: Duration,
    ) -> Result<OwnedMutexGuard<()>, SyncError> {
        let lock = {
            let mut inner = self.inner.lock().await;
            Arc::clone(inner.entry(study).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        timeout(wait, lock.lock_owned()).await.map_err(|_| {
            SyncError::upstream(format!(
                "timed out after {}ms acquiring lock for study {study}",
                wait.as_millis()
            ))
        })
    }
}
