// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout records and catalog baselines.

use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reference values for a named workout, as published by the workout catalog.
///
/// The catalog uses camelCase keys, kept here so stored baselines match the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutBaseline {
    /// Some catalogs publish numeric IDs; both forms are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub workout_id: String,
    pub workout_name: String,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub sets: u32,
    /// Minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub workout_type: String,
    pub calories_burned: f64,
}

/// One exercise instance inside a pending buffer or a daily aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutRecord {
    /// Unique within the aggregate that holds it
    pub workout_id: String,
    /// Catalog entry this record was derived from (None for custom workouts)
    #[serde(default)]
    pub catalog_id: Option<String>,
    pub workout_name: String,
    pub reps: u32,
    pub sets: u32,
    pub duration_minutes: u32,
    /// Category label (e.g. "Strength", "Cardio")
    pub workout_type: String,
    /// Always non-negative
    pub calories_burned: f64,
    /// Baseline used to scale calories, kept so edits re-scale consistently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<WorkoutBaseline>,
}

impl WorkoutRecord {
    /// Generate a fresh record identifier.
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for workoutId, got {}",
            other
        ))),
    }
}
