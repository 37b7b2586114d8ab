// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness service: the operations exposed to HTTP handlers.
//!
//! Adds workouts to the pending buffer (from the catalog or supplied by the
//! user) and delegates persistence to the [`DailyAggregateManager`].

use crate::error::{AppError, Result};
use crate::models::aggregate::sum_calories;
use crate::models::{DailyAggregate, WorkoutRecord};
use crate::services::aggregate::DailyAggregateManager;
use crate::services::calories::{direct_calories, scaled_calories};
use crate::services::catalog::WorkoutCatalog;
use chrono::NaiveDate;
use std::sync::Arc;

/// Longest accepted user, record or workout identifier.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Actual performance for a catalog workout. Missing values default to the baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Performance {
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub duration_minutes: Option<u32>,
}

impl Performance {
    pub fn is_empty(&self) -> bool {
        self.reps.is_none() && self.sets.is_none() && self.duration_minutes.is_none()
    }
}

/// A workout described entirely by the caller.
#[derive(Debug, Clone)]
pub struct CustomWorkout {
    pub workout_id: Option<String>,
    pub workout_name: String,
    pub reps: u32,
    pub sets: u32,
    pub duration_minutes: u32,
    pub workout_type: String,
    /// Used verbatim when present, otherwise derived with the direct formula.
    pub calories_burned: Option<f64>,
}

/// Committed and pending calories for a user today.
#[derive(Debug, Clone, PartialEq)]
pub struct CalorieSummary {
    pub user_id: String,
    pub date: NaiveDate,
    pub fitness_id: Option<String>,
    pub committed_calories: f64,
    pub pending_calories: f64,
}

impl CalorieSummary {
    pub fn total(&self) -> f64 {
        self.committed_calories + self.pending_calories
    }
}

/// Reject empty or oversized identifiers.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", kind)));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            kind, MAX_IDENTIFIER_LEN
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FitnessService {
    catalog: Arc<dyn WorkoutCatalog>,
    aggregates: DailyAggregateManager,
}

impl FitnessService {
    pub fn new(catalog: Arc<dyn WorkoutCatalog>, aggregates: DailyAggregateManager) -> Self {
        Self {
            catalog,
            aggregates,
        }
    }

    pub fn aggregates(&self) -> &DailyAggregateManager {
        &self.aggregates
    }

    /// Look up a workout in the catalog and buffer it for the user.
    ///
    /// With no performance values the catalog calories are copied as-is;
    /// otherwise calories are scaled from the baseline.
    pub async fn add_workout(
        &self,
        user_id: &str,
        workout_name: &str,
        performance: Performance,
    ) -> Result<WorkoutRecord> {
        validate_identifier("User ID", user_id)?;
        if workout_name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Workout name must not be empty".to_string(),
            ));
        }

        let baseline = self.catalog.lookup(workout_name).await?;

        let reps = performance.reps.unwrap_or(baseline.reps);
        let sets = performance.sets.unwrap_or(baseline.sets);
        let duration_minutes = performance.duration_minutes.unwrap_or(baseline.duration);
        let calories_burned = if performance.is_empty() {
            baseline.calories_burned
        } else {
            scaled_calories(&baseline, reps, sets, duration_minutes)
        };

        let record = WorkoutRecord {
            workout_id: WorkoutRecord::new_id(),
            catalog_id: Some(baseline.workout_id.clone()),
            workout_name: baseline.workout_name.clone(),
            reps,
            sets,
            duration_minutes,
            workout_type: baseline.workout_type.clone(),
            calories_burned,
            baseline: Some(baseline),
        };

        self.aggregates.pending().add(user_id, record.clone());
        tracing::info!(
            user_id,
            workout = %record.workout_name,
            workout_id = %record.workout_id,
            calories = record.calories_burned,
            "Catalog workout added"
        );
        Ok(record)
    }

    /// Buffer a caller-described workout.
    ///
    /// A caller-supplied ID must not already be pending or committed today
    /// (`Conflict`); otherwise a fresh ID is generated.
    pub async fn add_custom_workout(
        &self,
        user_id: &str,
        custom: CustomWorkout,
    ) -> Result<WorkoutRecord> {
        validate_identifier("User ID", user_id)?;

        let caller_id = match custom.workout_id {
            Some(id) => {
                validate_identifier("Workout ID", &id)?;
                Some(id)
            }
            None => None,
        };

        let calories_burned = match custom.calories_burned {
            Some(calories) if !calories.is_finite() || calories < 0.0 => {
                return Err(AppError::BadRequest(
                    "Calories burned must be a non-negative number".to_string(),
                ));
            }
            Some(calories) => calories,
            None => direct_calories(custom.reps, custom.sets, custom.duration_minutes),
        };

        let record = WorkoutRecord {
            workout_id: caller_id.clone().unwrap_or_else(WorkoutRecord::new_id),
            catalog_id: None,
            workout_name: custom.workout_name,
            reps: custom.reps,
            sets: custom.sets,
            duration_minutes: custom.duration_minutes,
            workout_type: custom.workout_type,
            calories_burned,
            baseline: None,
        };

        if caller_id.is_some() {
            self.aggregates
                .add_pending_with_id(user_id, record.clone())
                .await?;
        } else {
            self.aggregates.pending().add(user_id, record.clone());
        }

        tracing::info!(
            user_id,
            workout = %record.workout_name,
            workout_id = %record.workout_id,
            calories = record.calories_burned,
            "Custom workout added"
        );
        Ok(record)
    }

    pub fn pending_workouts(&self, user_id: &str) -> Result<Vec<WorkoutRecord>> {
        validate_identifier("User ID", user_id)?;
        Ok(self.aggregates.pending().pending(user_id))
    }

    /// Commit pending workouts, creating today's aggregate if needed.
    pub async fn save_workouts(&self, user_id: &str) -> Result<DailyAggregate> {
        validate_identifier("User ID", user_id)?;
        self.aggregates.commit(user_id).await
    }

    /// Commit pending workouts into an aggregate that already exists today.
    pub async fn update_workouts(&self, user_id: &str) -> Result<DailyAggregate> {
        validate_identifier("User ID", user_id)?;
        self.aggregates.commit_existing(user_id).await
    }

    /// Calories committed today plus calories still waiting in the buffer.
    pub async fn calorie_summary(&self, user_id: &str) -> Result<CalorieSummary> {
        validate_identifier("User ID", user_id)?;

        let today = self.aggregates.find_today(user_id).await?;
        let pending = self.aggregates.pending().pending(user_id);

        Ok(CalorieSummary {
            user_id: user_id.to_string(),
            date: self.aggregates.today().start,
            fitness_id: today.as_ref().and_then(|a| a.fitness_id.clone()),
            committed_calories: today.map_or(0.0, |a| a.total_calories_burned),
            pending_calories: sum_calories(&pending),
        })
    }
}
