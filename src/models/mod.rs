// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod aggregate;
pub mod workout;

pub use aggregate::{DailyAggregate, MergeOutcome};
pub use workout::{WorkoutBaseline, WorkoutRecord};
