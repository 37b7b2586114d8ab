// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily aggregate manager.
//!
//! Handles the core workflow:
//! 1. Resolve today's aggregate for a user (or start a new one)
//! 2. Merge the user's pending workouts into it
//! 3. Recompute the total and persist
//! 4. Clear exactly the merged workouts from the buffer
//!
//! Edits and deletes operate on persisted aggregates and bypass the buffer,
//! but take the same per-user lock as commits.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{DailyAggregate, WorkoutRecord};
use crate::services::calories::{direct_calories, scaled_calories};
use crate::services::pending::{PendingWorkoutBuffer, UserLockGuard};
use crate::time_utils::{Clock, DayWindow};
use chrono::{FixedOffset, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// New values for a stored workout. Every field is overwritten.
#[derive(Debug, Clone)]
pub struct WorkoutUpdate {
    pub workout_name: String,
    pub reps: u32,
    pub sets: u32,
    pub duration_minutes: u32,
    pub workout_type: String,
    /// Taken verbatim when present; otherwise recomputed if reps/sets/duration changed.
    pub calories_burned: Option<f64>,
}

impl WorkoutUpdate {
    /// Overwrite `record` with these values.
    fn apply_to(&self, record: &mut WorkoutRecord) {
        let performance_changed = record.reps != self.reps
            || record.sets != self.sets
            || record.duration_minutes != self.duration_minutes;

        record.workout_name = self.workout_name.clone();
        record.reps = self.reps;
        record.sets = self.sets;
        record.duration_minutes = self.duration_minutes;
        record.workout_type = self.workout_type.clone();

        record.calories_burned = match (self.calories_burned, &record.baseline) {
            (Some(calories), _) => calories,
            (None, _) if !performance_changed => record.calories_burned,
            (None, Some(baseline)) => {
                scaled_calories(baseline, self.reps, self.sets, self.duration_minutes)
            }
            (None, None) => direct_calories(self.reps, self.sets, self.duration_minutes),
        };
    }
}

/// When a commit may create a new aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Create today's aggregate if it does not exist yet.
    FindOrCreate,
    /// Only merge into an aggregate that already exists today.
    ExistingOnly,
}

/// Owns the find-or-create, merge and reconciliation of daily aggregates.
#[derive(Clone)]
pub struct DailyAggregateManager {
    store: Arc<dyn DocumentStore>,
    pending: PendingWorkoutBuffer,
    clock: Arc<dyn Clock>,
    day_offset: FixedOffset,
    store_timeout: Duration,
}

impl DailyAggregateManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        pending: PendingWorkoutBuffer,
        clock: Arc<dyn Clock>,
        day_offset: FixedOffset,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            pending,
            clock,
            day_offset,
            store_timeout,
        }
    }

    pub fn pending(&self) -> &PendingWorkoutBuffer {
        &self.pending
    }

    /// The calendar day containing the clock's current instant.
    pub fn today(&self) -> DayWindow {
        DayWindow::containing(self.clock.now(), self.day_offset)
    }

    /// Run a store call, turning an elapsed timeout into a persistence error.
    async fn with_timeout<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| {
                tracing::warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "Document store timed out");
                AppError::Persistence(format!(
                    "Document store {} timed out after {:?}",
                    op, self.store_timeout
                ))
            })?
    }

    async fn save(&self, aggregate: &DailyAggregate) -> Result<DailyAggregate> {
        self.with_timeout("save", self.store.save(aggregate)).await
    }

    /// Today's persisted aggregate for the user, if any.
    pub async fn find_today(&self, user_id: &str) -> Result<Option<DailyAggregate>> {
        let window = self.today();
        let mut found = self
            .with_timeout(
                "query",
                self.store
                    .find_by_user_and_date_range(user_id, window.start, window.end),
            )
            .await?;

        if found.len() > 1 {
            tracing::warn!(
                user_id,
                count = found.len(),
                date = %window.start,
                "Multiple aggregates for one day, using the first"
            );
        }

        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// Today's aggregate, or a fresh unpersisted one with no workouts.
    pub async fn find_or_create_today(&self, user_id: &str) -> Result<DailyAggregate> {
        match self.find_today(user_id).await? {
            Some(aggregate) => Ok(aggregate),
            None => {
                tracing::debug!(user_id, "No aggregate today, starting a new one");
                Ok(DailyAggregate::new(user_id, self.today().start))
            }
        }
    }

    /// Merge the user's pending workouts into today's aggregate and persist it.
    ///
    /// The buffer is cleared only after the store accepted the write, so a
    /// failed commit can be retried with the same workouts.
    pub async fn commit(&self, user_id: &str) -> Result<DailyAggregate> {
        self.commit_with(user_id, CommitMode::FindOrCreate).await
    }

    /// Like [`commit`](Self::commit), but fails with `NotFound` if no aggregate exists today.
    pub async fn commit_existing(&self, user_id: &str) -> Result<DailyAggregate> {
        self.commit_with(user_id, CommitMode::ExistingOnly).await
    }

    async fn commit_with(&self, user_id: &str, mode: CommitMode) -> Result<DailyAggregate> {
        let _guard = self.pending.lock_user(user_id).await;

        let batch = self.pending.drain(user_id);
        let mut aggregate = match mode {
            CommitMode::FindOrCreate => self.find_or_create_today(user_id).await?,
            CommitMode::ExistingOnly => self.find_today(user_id).await?.ok_or_else(|| {
                AppError::NotFound(format!(
                    "No fitness entry found for user {} on current date",
                    user_id
                ))
            })?,
        };

        if batch.is_empty() {
            if aggregate.is_persisted() {
                tracing::debug!(user_id, "Nothing pending, aggregate unchanged");
                return Ok(aggregate);
            }
            return Err(AppError::BadRequest(format!(
                "No pending workouts to save for user {}",
                user_id
            )));
        }

        let outcome = aggregate.merge(batch.records.iter().cloned());
        if outcome.already_applied > 0 {
            tracing::warn!(
                user_id,
                fitness_id = ?aggregate.fitness_id,
                already_applied = outcome.already_applied,
                "Pending workouts were already committed, skipping them"
            );
        }

        if outcome.appended == 0 {
            // Every record landed in an earlier commit whose reply was lost
            self.pending.acknowledge(&batch);
            return Ok(aggregate);
        }

        let created = !aggregate.is_persisted();
        let saved = self.save(&aggregate).await?;
        self.pending.acknowledge(&batch);

        tracing::info!(
            user_id,
            fitness_id = ?saved.fitness_id,
            merged = outcome.appended,
            created,
            total_calories = saved.total_calories_burned,
            "Pending workouts committed"
        );

        Ok(saved)
    }

    /// Buffer a workout whose ID was chosen by the caller.
    ///
    /// Fails with `Conflict` when the ID is already pending or already part of
    /// today's aggregate. Runs under the user's commit lock so the check and
    /// the append cannot interleave with a commit.
    pub async fn add_pending_with_id(&self, user_id: &str, record: WorkoutRecord) -> Result<()> {
        let _guard = self.pending.lock_user(user_id).await;

        let pending_clash = self
            .pending
            .pending(user_id)
            .iter()
            .any(|w| w.workout_id == record.workout_id);
        let committed_clash = !pending_clash
            && self
                .find_today(user_id)
                .await?
                .is_some_and(|a| a.contains_workout(&record.workout_id));

        if pending_clash || committed_clash {
            return Err(AppError::Conflict(format!(
                "Workout with ID {} already exists for user {} today",
                record.workout_id, user_id
            )));
        }

        self.pending.add(user_id, record);
        Ok(())
    }

    /// Read an aggregate and hold its owner's commit lock, re-reading once the lock is held.
    async fn get_locked(&self, fitness_id: &str) -> Result<(UserLockGuard, DailyAggregate)> {
        let user_id = self.get(fitness_id).await?.user_id;
        let guard = self.pending.lock_user(&user_id).await;
        let aggregate = self.get(fitness_id).await?;
        Ok((guard, aggregate))
    }

    /// Fetch an aggregate by its document ID.
    pub async fn get(&self, fitness_id: &str) -> Result<DailyAggregate> {
        self.with_timeout("read", self.store.find_by_id(fitness_id))
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Fitness record with ID {} not found", fitness_id))
            })
    }

    /// Overwrite one workout of a stored aggregate.
    pub async fn edit(
        &self,
        fitness_id: &str,
        workout_id: &str,
        update: &WorkoutUpdate,
    ) -> Result<DailyAggregate> {
        let (_guard, mut aggregate) = self.get_locked(fitness_id).await?;

        let workout = aggregate
            .workout_mut(workout_id)
            .ok_or_else(|| AppError::NotFound(format!("Workout with ID {} not found", workout_id)))?;
        update.apply_to(workout);
        let calories = workout.calories_burned;
        aggregate.recompute_total();

        let saved = self.save(&aggregate).await?;
        tracing::info!(
            fitness_id,
            workout_id,
            calories,
            total_calories = saved.total_calories_burned,
            "Workout edited"
        );
        Ok(saved)
    }

    /// Remove one workout from a stored aggregate.
    pub async fn delete(&self, fitness_id: &str, workout_id: &str) -> Result<DailyAggregate> {
        let (_guard, aggregate) = self.get_locked(fitness_id).await?;
        self.remove_and_save(aggregate, workout_id).await
    }

    /// Remove one workout from the user's aggregate for today.
    pub async fn delete_today(&self, user_id: &str, workout_id: &str) -> Result<DailyAggregate> {
        let _guard = self.pending.lock_user(user_id).await;
        let aggregate = self.find_today(user_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("No fitness record found for userId {} today", user_id))
        })?;
        self.remove_and_save(aggregate, workout_id).await
    }

    async fn remove_and_save(
        &self,
        mut aggregate: DailyAggregate,
        workout_id: &str,
    ) -> Result<DailyAggregate> {
        aggregate
            .remove_workout(workout_id)
            .ok_or_else(|| AppError::NotFound(format!("Workout with ID {} not found", workout_id)))?;

        let saved = self.save(&aggregate).await?;
        tracing::info!(
            fitness_id = ?saved.fitness_id,
            workout_id,
            remaining = saved.workout_list.len(),
            total_calories = saved.total_calories_burned,
            "Workout deleted"
        );
        Ok(saved)
    }

    /// Today's aggregate, failing with `NotFound` when nothing was committed yet.
    pub async fn get_today(&self, user_id: &str) -> Result<DailyAggregate> {
        self.find_today(user_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("No fitness record found for userId {} today", user_id))
        })
    }

    /// Every aggregate of the user dated in `[start, end)`.
    ///
    /// An empty result is reported as `NotFound`.
    pub async fn get_by_user_and_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        if start >= end {
            return Err(AppError::BadRequest(format!(
                "Range start {} must be before end {}",
                start, end
            )));
        }

        let found = self
            .with_timeout(
                "query",
                self.store.find_by_user_and_date_range(user_id, start, end),
            )
            .await?;

        if found.is_empty() {
            return Err(AppError::NotFound(format!(
                "No fitness records found for user {} between {} and {}",
                user_id, start, end
            )));
        }

        tracing::debug!(user_id, %start, %end, count = found.len(), "Fetched aggregates by range");
        Ok(found)
    }
}
