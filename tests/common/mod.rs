// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fitness_tracker::config::Config;
use fitness_tracker::db::{DocumentStore, FirestoreDb, InMemoryStore};
use fitness_tracker::error::{AppError, Result};
use fitness_tracker::models::WorkoutBaseline;
use fitness_tracker::routes::create_router;
use fitness_tracker::services::catalog::find_in_catalog;
use fitness_tracker::services::WorkoutCatalog;
use fitness_tracker::time_utils::FixedClock;
use fitness_tracker::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// The instant every test treats as "now".
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 15, 30, 0).unwrap()
}

#[allow(dead_code)]
pub fn today() -> NaiveDate {
    fixed_now().date_naive()
}

#[allow(dead_code)]
pub fn squat() -> WorkoutBaseline {
    WorkoutBaseline {
        workout_id: "1".to_string(),
        workout_name: "Squat".to_string(),
        reps: 10,
        sets: 3,
        duration: 30,
        workout_type: "Strength".to_string(),
        calories_burned: 200.0,
    }
}

#[allow(dead_code)]
pub fn push_ups() -> WorkoutBaseline {
    WorkoutBaseline {
        workout_id: "2".to_string(),
        workout_name: "Push Ups".to_string(),
        reps: 15,
        sets: 3,
        duration: 10,
        workout_type: "Strength".to_string(),
        calories_burned: 50.0,
    }
}

/// Catalog served from memory.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubCatalog {
    entries: Vec<WorkoutBaseline>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

#[allow(dead_code)]
impl StubCatalog {
    pub fn new(entries: Vec<WorkoutBaseline>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkoutCatalog for StubCatalog {
    async fn lookup(&self, name: &str) -> Result<WorkoutBaseline> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable(
                "Catalog request failed".to_string(),
            ));
        }
        find_in_catalog(&self.entries, name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workout '{}' not found in catalog", name)))
    }
}

/// Test dependencies shared by the router and the assertions.
#[allow(dead_code)]
pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: InMemoryStore,
    pub catalog: Arc<StubCatalog>,
}

/// Build state over an arbitrary store, with the stub catalog and a fixed clock.
#[allow(dead_code)]
pub fn test_state(store: Arc<dyn DocumentStore>, catalog: Arc<StubCatalog>) -> Arc<AppState> {
    Arc::new(AppState::new(
        Config::test_default(),
        store,
        catalog,
        Arc::new(FixedClock(fixed_now())),
    ))
}

/// State over an in-memory store with Squat and Push Ups in the catalog.
#[allow(dead_code)]
pub fn test_context() -> TestContext {
    let store = InMemoryStore::new();
    let catalog = Arc::new(StubCatalog::new(vec![squat(), push_ups()]));
    TestContext {
        state: test_state(Arc::new(store.clone()), catalog.clone()),
        store,
        catalog,
    }
}

/// Create a test app with in-memory dependencies.
/// Returns the router and the test context.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, TestContext) {
    let ctx = test_context();
    (create_router(ctx.state.clone()), ctx)
}

/// Create a test app backed by an offline Firestore client.
#[allow(dead_code)]
pub fn create_offline_app() -> axum::Router {
    let catalog = Arc::new(StubCatalog::new(vec![squat()]));
    create_router(test_state(Arc::new(FirestoreDb::new_mock()), catalog))
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

#[allow(dead_code)]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
