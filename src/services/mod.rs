// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod calories;
pub mod catalog;
pub mod fitness;
pub mod pending;

pub use aggregate::{DailyAggregateManager, WorkoutUpdate};
pub use catalog::{HttpWorkoutCatalog, WorkoutCatalog};
pub use fitness::{CalorieSummary, CustomWorkout, FitnessService, Performance};
pub use pending::{PendingBatch, PendingWorkoutBuffer, UserLockGuard};
