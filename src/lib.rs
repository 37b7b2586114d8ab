// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness-Tracker: log workouts and keep per-day calorie totals
//!
//! This crate provides the backend API for buffering workouts, committing
//! them into one daily aggregate per user and reporting calories burned.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{DailyAggregateManager, FitnessService, PendingWorkoutBuffer, WorkoutCatalog};
use std::sync::Arc;
use time_utils::{offset_from_minutes, Clock};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub fitness: FitnessService,
}

impl AppState {
    /// Wire the services on top of a document store and a workout catalog.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn WorkoutCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let aggregates = DailyAggregateManager::new(
            store,
            PendingWorkoutBuffer::new(),
            clock,
            offset_from_minutes(config.day_utc_offset_minutes),
            config.store_timeout,
        );

        Self {
            fitness: FitnessService::new(catalog, aggregates),
            config,
        }
    }
}
