// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations on daily aggregates.
//!
//! Aggregates live in a single collection keyed by `{user_id}_{date}`.
//! Writes read the stored `version` and commit inside one transaction.

use crate::db::{aggregate_document_id, collections, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::DailyAggregate;
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::NaiveDate;
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreWritePrecondition};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::Persistence(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Persistence(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Persistence("Database not connected (offline mode)".to_string())
        })
    }

    async fn read_aggregate(&self, fitness_id: &str) -> Result<Option<DailyAggregate>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_AGGREGATES)
            .obj()
            .one(fitness_id)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}

/// Map a failure inside a save transaction; contention and failed preconditions are conflicts.
fn transaction_error(fitness_id: &str, stage: &str, err: FirestoreError) -> AppError {
    let conflict = match &err {
        // ALREADY_EXISTS from a failed create precondition
        FirestoreError::DataConflictError(_) | FirestoreError::DataNotFoundError(_) => true,
        FirestoreError::DatabaseError(e) => {
            matches!(e.public.code.as_str(), "Aborted" | "FailedPrecondition")
        }
        _ => false,
    };
    if conflict {
        AppError::Conflict(format!(
            "Fitness record {} was modified concurrently: {}",
            fitness_id, err
        ))
    } else {
        AppError::Persistence(format!("Transaction {} failed: {}", stage, err))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    /// Write an aggregate after checking that nobody saved it since it was read.
    ///
    /// The current document is read inside the transaction, so a concurrent
    /// writer aborts the commit. A create also carries an `Exists(false)`
    /// precondition and an update `Exists(true)`.
    async fn save(&self, aggregate: &DailyAggregate) -> Result<DailyAggregate> {
        let client = self.get_client()?;
        let fitness_id = aggregate
            .fitness_id
            .clone()
            .unwrap_or_else(|| aggregate_document_id(&aggregate.user_id, aggregate.fitness_date));

        let mut transaction = client.begin_transaction().await.map_err(|e| {
            AppError::Persistence(format!("Failed to begin transaction: {}", e))
        })?;

        // Read within the transaction so the document is registered for conflict detection
        let tx_client = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        let current: Option<DailyAggregate> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::DAILY_AGGREGATES)
            .obj()
            .one(&fitness_id)
            .await
            .map_err(|e| transaction_error(&fitness_id, "read", e))?;

        match (&aggregate.fitness_id, current) {
            (None, Some(_)) => {
                let _ = transaction.rollback().await;
                return Err(AppError::Conflict(format!(
                    "Fitness record for user {} on {} already exists",
                    aggregate.user_id, aggregate.fitness_date
                )));
            }
            (Some(_), None) => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!(
                    "Fitness record with ID {} not found",
                    fitness_id
                )));
            }
            (Some(_), Some(current)) if current.version != aggregate.version => {
                let _ = transaction.rollback().await;
                return Err(AppError::Conflict(format!(
                    "Fitness record {} was modified concurrently (expected version {}, found {})",
                    fitness_id, aggregate.version, current.version
                )));
            }
            _ => {}
        }

        let mut stored = aggregate.clone();
        stored.fitness_id = Some(fitness_id.clone());
        stored.version = aggregate.version + 1;
        stored.updated_at = format_utc_rfc3339(chrono::Utc::now());

        let precondition = FirestoreWritePrecondition::Exists(aggregate.fitness_id.is_some());

        client
            .fluent()
            .update()
            .in_col(collections::DAILY_AGGREGATES)
            .precondition(precondition)
            .document_id(&fitness_id)
            .object(&stored)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Persistence(format!("Failed to add aggregate to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| transaction_error(&fitness_id, "commit", e))?;

        tracing::debug!(
            fitness_id = %fitness_id,
            version = stored.version,
            workouts = stored.workout_list.len(),
            "Aggregate saved"
        );

        Ok(stored)
    }

    async fn find_by_id(&self, fitness_id: &str) -> Result<Option<DailyAggregate>> {
        self.read_aggregate(fitness_id).await
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        let user_id = user_id.to_string();
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_AGGREGATES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("fitness_date").greater_than_or_equal(start.clone()),
                    q.field("fitness_date").less_than(end.clone()),
                ])
            })
            .order_by([(
                "fitness_date",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}
