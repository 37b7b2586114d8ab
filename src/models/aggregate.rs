// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily aggregate: one document per user per calendar day.
//!
//! Every mutating method leaves `total_calories_burned` equal to the sum of
//! the contained workouts' calories.

use crate::models::WorkoutRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored daily aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyAggregate {
    /// Document ID, assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_id: Option<String>,
    pub user_id: String,
    /// Calendar day (serialized as `YYYY-MM-DD`, so it sorts as a string)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub fitness_date: NaiveDate,
    /// Workouts in insertion order
    #[serde(default)]
    pub workout_list: Vec<WorkoutRecord>,
    #[serde(default)]
    pub total_calories_burned: f64,
    /// Incremented by the store on every successful save
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
    /// Last save timestamp (RFC3339)
    #[serde(default)]
    pub updated_at: String,
}

impl DailyAggregate {
    /// A new, not yet persisted aggregate with no workouts.
    pub fn new(user_id: impl Into<String>, fitness_date: NaiveDate) -> Self {
        Self {
            fitness_id: None,
            user_id: user_id.into(),
            fitness_date,
            workout_list: Vec::new(),
            total_calories_burned: 0.0,
            version: 0,
            updated_at: String::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.fitness_id.is_some()
    }

    /// Append workouts in order, skipping any whose ID is already in the list.
    ///
    /// Workout IDs are unique per user and day (generated, or checked when a
    /// caller supplies one), so a present ID means the record was applied by
    /// an earlier commit whose acknowledgement was lost. Records with an
    /// empty ID get a fresh one.
    pub fn merge(&mut self, records: impl IntoIterator<Item = WorkoutRecord>) -> MergeOutcome {
        let mut taken: HashSet<String> = self
            .workout_list
            .iter()
            .map(|w| w.workout_id.clone())
            .collect();
        let mut outcome = MergeOutcome::default();

        for mut record in records {
            if record.workout_id.is_empty() {
                record.workout_id = WorkoutRecord::new_id();
            } else if taken.contains(&record.workout_id) {
                outcome.already_applied += 1;
                continue;
            }
            taken.insert(record.workout_id.clone());
            self.workout_list.push(record);
            outcome.appended += 1;
        }

        self.recompute_total();
        outcome
    }

    /// Whether a workout with this ID is already part of the aggregate.
    pub fn contains_workout(&self, workout_id: &str) -> bool {
        self.workout(workout_id).is_some()
    }

    pub fn workout(&self, workout_id: &str) -> Option<&WorkoutRecord> {
        self.workout_list.iter().find(|w| w.workout_id == workout_id)
    }

    pub fn workout_mut(&mut self, workout_id: &str) -> Option<&mut WorkoutRecord> {
        self.workout_list
            .iter_mut()
            .find(|w| w.workout_id == workout_id)
    }

    /// Remove the workout with the given ID. Returns it, or None if no workout matched.
    pub fn remove_workout(&mut self, workout_id: &str) -> Option<WorkoutRecord> {
        let index = self
            .workout_list
            .iter()
            .position(|w| w.workout_id == workout_id)?;
        let removed = self.workout_list.remove(index);
        self.recompute_total();
        Some(removed)
    }

    /// Recalculate the total from the full workout list.
    pub fn recompute_total(&mut self) {
        self.total_calories_burned = sum_calories(&self.workout_list);
    }
}

/// Result of [`DailyAggregate::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub appended: usize,
    /// Records skipped because their ID was already present
    pub already_applied: usize,
}

/// Sum of calories over a list of workouts.
pub fn sum_calories(workouts: &[WorkoutRecord]) -> f64 {
    workouts.iter().map(|w| w.calories_burned).sum()
}
