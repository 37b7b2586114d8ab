// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calorie calculation.
//!
//! Scaling from a catalog baseline is the canonical formula. The direct
//! formula is the simplified path for custom workouts that come with no
//! baseline and no explicit calorie count.

use crate::models::WorkoutBaseline;

/// Calories per rep·set·minute in the direct formula.
pub const DIRECT_CALORIE_FACTOR: f64 = 0.1;

/// Relative weight of duration against the baseline.
const DURATION_WEIGHT: f64 = 1.0;
/// Relative weight of repetitions against the baseline.
const REPS_WEIGHT: f64 = 0.5;
/// Relative weight of sets against the baseline.
const SETS_WEIGHT: f64 = 0.3;

/// `reps × sets × duration × 0.1`
pub fn direct_calories(reps: u32, sets: u32, duration_minutes: u32) -> f64 {
    f64::from(reps) * f64::from(sets) * f64::from(duration_minutes) * DIRECT_CALORIE_FACTOR
}

/// Scale the baseline's calories by the user's actual performance.
///
/// A term whose baseline denominator is zero contributes nothing.
pub fn scaled_calories(
    baseline: &WorkoutBaseline,
    reps: u32,
    sets: u32,
    duration_minutes: u32,
) -> f64 {
    let base = baseline.calories_burned;

    scaled_term(base, DURATION_WEIGHT, duration_minutes, baseline.duration)
        + scaled_term(base, REPS_WEIGHT, reps, baseline.reps)
        + scaled_term(base, SETS_WEIGHT, sets, baseline.sets)
}

fn scaled_term(base_calories: f64, weight: f64, actual: u32, baseline: u32) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    base_calories * weight * (f64::from(actual) / f64::from(baseline))
}
