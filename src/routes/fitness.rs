// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness routes: pending workouts, daily aggregates and calorie totals.

use crate::error::{AppError, Result};
use crate::models::aggregate::sum_calories;
use crate::models::{DailyAggregate, WorkoutRecord};
use crate::services::fitness::validate_identifier;
use crate::services::{CustomWorkout, Performance, WorkoutUpdate};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fitness routes, all under `/health/fitness`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health/fitness/users/{user_id}/workouts/{workout_name}",
            post(add_workout),
        )
        .route(
            "/health/fitness/users/{user_id}/custom-workouts",
            post(add_custom_workout),
        )
        .route("/health/fitness/users/{user_id}/pending", get(get_pending))
        .route(
            "/health/fitness/users/{user_id}/save-workouts",
            post(save_workouts),
        )
        .route(
            "/health/fitness/users/{user_id}/update-workouts",
            post(update_workouts),
        )
        .route("/health/fitness/users/{user_id}/today", get(get_today))
        .route(
            "/health/fitness/users/{user_id}/today/calories",
            get(get_calories),
        )
        .route(
            "/health/fitness/users/{user_id}/today/workouts/{workout_id}",
            delete(delete_today_workout),
        )
        .route("/health/fitness/users/{user_id}/records", get(get_by_range))
        .route("/health/fitness/records/{fitness_id}", get(get_record))
        .route(
            "/health/fitness/records/{fitness_id}/workouts/{workout_id}",
            put(edit_workout).delete(delete_workout),
        )
}

// ─── Pending Workouts ────────────────────────────────────────

/// Optional actual performance for a catalog workout.
#[derive(Debug, Default, Deserialize, Validate)]
struct PerformanceQuery {
    #[validate(range(max = 10_000))]
    reps: Option<u32>,
    #[validate(range(max = 10_000))]
    sets: Option<u32>,
    /// Minutes
    #[validate(range(max = 1_440))]
    duration: Option<u32>,
}

/// Add a catalog workout to the user's pending list.
async fn add_workout(
    State(state): State<Arc<AppState>>,
    Path((user_id, workout_name)): Path<(String, String)>,
    query: std::result::Result<Query<PerformanceQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<WorkoutRecord>)> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    params.validate()?;

    let record = state
        .fitness
        .add_workout(
            &user_id,
            &workout_name,
            Performance {
                reps: params.reps,
                sets: params.sets,
                duration_minutes: params.duration,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Body for a caller-described workout.
#[derive(Debug, Deserialize, Validate)]
pub struct CustomWorkoutRequest {
    #[validate(length(min = 1, max = 128))]
    pub workout_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub workout_name: String,
    #[validate(range(max = 10_000))]
    #[serde(default)]
    pub reps: u32,
    #[validate(range(max = 10_000))]
    #[serde(default)]
    pub sets: u32,
    #[validate(range(max = 1_440))]
    #[serde(default)]
    pub duration_minutes: u32,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub workout_type: String,
    #[validate(range(min = 0.0))]
    pub calories_burned: Option<f64>,
}

/// Add a caller-described workout to the user's pending list.
async fn add_custom_workout(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<CustomWorkoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkoutRecord>)> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    body.validate()?;

    let record = state
        .fitness
        .add_custom_workout(
            &user_id,
            CustomWorkout {
                workout_id: body.workout_id,
                workout_name: body.workout_name,
                reps: body.reps,
                sets: body.sets,
                duration_minutes: body.duration_minutes,
                workout_type: body.workout_type,
                calories_burned: body.calories_burned,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PendingWorkoutsResponse {
    pub user_id: String,
    pub workouts: Vec<WorkoutRecord>,
    pub pending_calories: f64,
}

/// List workouts not yet committed.
async fn get_pending(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PendingWorkoutsResponse>> {
    let workouts = state.fitness.pending_workouts(&user_id)?;
    Ok(Json(PendingWorkoutsResponse {
        pending_calories: sum_calories(&workouts),
        user_id,
        workouts,
    }))
}

// ─── Commit ──────────────────────────────────────────────────

/// Merge pending workouts into today's aggregate, creating it if needed.
async fn save_workouts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DailyAggregate>> {
    Ok(Json(state.fitness.save_workouts(&user_id).await?))
}

/// Merge pending workouts into an aggregate that already exists today.
async fn update_workouts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DailyAggregate>> {
    Ok(Json(state.fitness.update_workouts(&user_id).await?))
}

// ─── Daily Aggregates ────────────────────────────────────────

async fn get_today(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DailyAggregate>> {
    validate_identifier("User ID", &user_id)?;
    Ok(Json(state.fitness.aggregates().get_today(&user_id).await?))
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(fitness_id): Path<String>,
) -> Result<Json<DailyAggregate>> {
    validate_identifier("Fitness ID", &fitness_id)?;
    Ok(Json(state.fitness.aggregates().get(&fitness_id).await?))
}

#[derive(Deserialize)]
struct RangeQuery {
    /// First day included (YYYY-MM-DD)
    start: String,
    /// First day excluded (YYYY-MM-DD)
    end: String,
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        AppError::BadRequest(format!(
            "Invalid '{}' parameter: must be a YYYY-MM-DD date",
            name
        ))
    })
}

/// Aggregates of a user dated in `[start, end)`.
async fn get_by_range(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyAggregate>>> {
    validate_identifier("User ID", &user_id)?;
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let start = parse_date("start", &params.start)?;
    let end = parse_date("end", &params.end)?;

    tracing::debug!(user_id = %user_id, %start, %end, "Fetching aggregates by range");

    let records = state
        .fitness
        .aggregates()
        .get_by_user_and_range(&user_id, start, end)
        .await?;
    Ok(Json(records))
}

// ─── Workout Edits ───────────────────────────────────────────

/// Full replacement of a stored workout's fields.
#[derive(Debug, Deserialize, Validate)]
pub struct EditWorkoutRequest {
    #[validate(length(min = 1, max = 100))]
    pub workout_name: String,
    #[validate(range(max = 10_000))]
    pub reps: u32,
    #[validate(range(max = 10_000))]
    pub sets: u32,
    #[validate(range(max = 1_440))]
    pub duration_minutes: u32,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub workout_type: String,
    #[validate(range(min = 0.0))]
    pub calories_burned: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutChangeResponse {
    pub success: bool,
    pub message: String,
    pub record: DailyAggregate,
}

async fn edit_workout(
    State(state): State<Arc<AppState>>,
    Path((fitness_id, workout_id)): Path<(String, String)>,
    payload: std::result::Result<Json<EditWorkoutRequest>, JsonRejection>,
) -> Result<Json<WorkoutChangeResponse>> {
    validate_identifier("Fitness ID", &fitness_id)?;
    validate_identifier("Workout ID", &workout_id)?;
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    body.validate()?;
    if body.calories_burned.is_some_and(|c| !c.is_finite()) {
        return Err(AppError::BadRequest(
            "Calories burned must be a finite number".to_string(),
        ));
    }

    let update = WorkoutUpdate {
        workout_name: body.workout_name,
        reps: body.reps,
        sets: body.sets,
        duration_minutes: body.duration_minutes,
        workout_type: body.workout_type,
        calories_burned: body.calories_burned,
    };

    let record = state
        .fitness
        .aggregates()
        .edit(&fitness_id, &workout_id, &update)
        .await?;

    Ok(Json(WorkoutChangeResponse {
        success: true,
        message: "Workout updated successfully".to_string(),
        record,
    }))
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Path((fitness_id, workout_id)): Path<(String, String)>,
) -> Result<Json<WorkoutChangeResponse>> {
    validate_identifier("Fitness ID", &fitness_id)?;
    validate_identifier("Workout ID", &workout_id)?;

    let record = state
        .fitness
        .aggregates()
        .delete(&fitness_id, &workout_id)
        .await?;

    Ok(Json(WorkoutChangeResponse {
        success: true,
        message: "Workout deleted successfully".to_string(),
        record,
    }))
}

async fn delete_today_workout(
    State(state): State<Arc<AppState>>,
    Path((user_id, workout_id)): Path<(String, String)>,
) -> Result<Json<WorkoutChangeResponse>> {
    validate_identifier("User ID", &user_id)?;
    validate_identifier("Workout ID", &workout_id)?;

    let record = state
        .fitness
        .aggregates()
        .delete_today(&user_id, &workout_id)
        .await?;

    Ok(Json(WorkoutChangeResponse {
        success: true,
        message: "Workout deleted successfully".to_string(),
        record,
    }))
}

// ─── Calories ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CaloriesResponse {
    pub user_id: String,
    pub date: String,
    pub fitness_id: Option<String>,
    pub committed_calories: f64,
    pub pending_calories: f64,
    pub total_calories_burned: f64,
}

/// Calories committed today plus calories still pending.
async fn get_calories(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<CaloriesResponse>> {
    let summary = state.fitness.calorie_summary(&user_id).await?;
    Ok(Json(CaloriesResponse {
        total_calories_burned: summary.total(),
        date: summary.date.format(DATE_FORMAT).to_string(),
        user_id: summary.user_id,
        fitness_id: summary.fitness_id,
        committed_calories: summary.committed_calories,
        pending_calories: summary.pending_calories,
    }))
}
