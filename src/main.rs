// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness-Tracker API Server
//!
//! Buffers workouts per user and commits them into daily aggregates with
//! calorie totals derived from a public workout catalog.

use fitness_tracker::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, InMemoryStore},
    services::HttpWorkoutCatalog,
    time_utils::SystemClock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.store_backend, "Starting Fitness-Tracker API");

    // Initialize document store
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; aggregates are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    // Workout catalog client
    let catalog = Arc::new(HttpWorkoutCatalog::new(
        config.catalog_url.clone(),
        config.catalog_timeout,
        config.catalog_cache_ttl,
    )?);
    tracing::info!(
        url = %config.catalog_url,
        cache_ttl_secs = config.catalog_cache_ttl.as_secs(),
        "Workout catalog configured"
    );

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        catalog,
        Arc::new(SystemClock),
    ));

    // Build router
    let app = fitness_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitness_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
