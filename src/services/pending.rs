// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pending workout buffer.
//!
//! Workouts added by a user accumulate here until the next commit merges
//! them into the day's aggregate. Entries are per-user and guarded by the
//! map's shard locks, so `add` and `drain` on one user always see a
//! consistent list. Contents are process-local and lost on restart.

use crate::models::WorkoutRecord;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Snapshot of a user's pending workouts taken by [`PendingWorkoutBuffer::drain`].
#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub user_id: String,
    pub records: Vec<WorkoutRecord>,
}

impl PendingBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// In-process buffer of uncommitted workouts, keyed by user ID.
#[derive(Clone, Default)]
pub struct PendingWorkoutBuffer {
    entries: Arc<DashMap<String, Vec<WorkoutRecord>>>,
    /// Per-user mutex serializing drain → persist → acknowledge.
    commit_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PendingWorkoutBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a workout to the user's pending list.
    pub fn add(&self, user_id: &str, record: WorkoutRecord) {
        let mut entry = self.entries.entry(user_id.to_string()).or_default();
        entry.push(record);
        tracing::debug!(user_id, pending = entry.len(), "Workout buffered");
    }

    /// Snapshot the user's pending workouts without removing them.
    ///
    /// Call [`acknowledge`](Self::acknowledge) once the batch has been persisted.
    pub fn drain(&self, user_id: &str) -> PendingBatch {
        PendingBatch {
            user_id: user_id.to_string(),
            records: self.pending(user_id),
        }
    }

    /// Remove the records of a persisted batch.
    ///
    /// Only the drained prefix is removed; workouts added after the drain stay pending.
    pub fn acknowledge(&self, batch: &PendingBatch) {
        if batch.is_empty() {
            return;
        }
        if let Some(mut entry) = self.entries.get_mut(&batch.user_id) {
            let n = batch.len().min(entry.len());
            entry.drain(..n);
        }
        self.entries.remove_if(&batch.user_id, |_, records| records.is_empty());
    }

    /// Current pending workouts for a user (empty if none).
    pub fn pending(&self, user_id: &str) -> Vec<WorkoutRecord> {
        self.entries
            .get(user_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Take the user's commit lock, waiting for any commit already in progress.
    pub async fn lock_user(&self, user_id: &str) -> UserLockGuard {
        let lock = self
            .commit_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            user_id: user_id.to_string(),
            locks: self.commit_locks.clone(),
        }
    }

    /// Number of users with a commit lock currently allocated.
    pub fn lock_count(&self) -> usize {
        self.commit_locks.len()
    }
}

/// Held commit lock for one user. The lock entry is freed once nobody holds or awaits it.
pub struct UserLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    user_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Contenders clone the Arc under the shard lock, so a count of 1 means none are waiting
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
