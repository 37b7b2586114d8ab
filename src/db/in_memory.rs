// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Follows the same identifier and version rules as Firestore. Useful for
//! local development and tests.

use crate::db::{aggregate_document_id, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::DailyAggregate;
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<HashMap<String, DailyAggregate>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with a persistence error (useful for tests).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Insert a document as-is, bypassing ID and version checks (test seeding).
    pub async fn insert_raw(&self, aggregate: DailyAggregate) {
        let id = aggregate
            .fitness_id
            .clone()
            .unwrap_or_else(|| aggregate_document_id(&aggregate.user_id, aggregate.fitness_date));
        let mut stored = aggregate;
        stored.fitness_id = Some(id.clone());
        self.documents.write().await.insert(id, stored);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn save(&self, aggregate: &DailyAggregate) -> Result<DailyAggregate> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(
                "In-memory store is rejecting writes".to_string(),
            ));
        }

        let mut documents = self.documents.write().await;

        let id = match &aggregate.fitness_id {
            Some(id) => {
                let current = documents.get(id).ok_or_else(|| {
                    AppError::NotFound(format!("Fitness record with ID {} not found", id))
                })?;
                if current.version != aggregate.version {
                    return Err(AppError::Conflict(format!(
                        "Fitness record {} was modified concurrently (expected version {}, found {})",
                        id, aggregate.version, current.version
                    )));
                }
                id.clone()
            }
            None => {
                let id = aggregate_document_id(&aggregate.user_id, aggregate.fitness_date);
                if documents.contains_key(&id) {
                    return Err(AppError::Conflict(format!(
                        "Fitness record for user {} on {} already exists",
                        aggregate.user_id, aggregate.fitness_date
                    )));
                }
                id
            }
        };

        let mut stored = aggregate.clone();
        stored.fitness_id = Some(id.clone());
        stored.version = aggregate.version + 1;
        stored.updated_at = format_utc_rfc3339(chrono::Utc::now());
        documents.insert(id, stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, fitness_id: &str) -> Result<Option<DailyAggregate>> {
        Ok(self.documents.read().await.get(fitness_id).cloned())
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        let documents = self.documents.read().await;
        let mut matches: Vec<DailyAggregate> = documents
            .values()
            .filter(|a| a.user_id == user_id && a.fitness_date >= start && a.fitness_date < end)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.fitness_date
                .cmp(&b.fitness_date)
                .then_with(|| a.fitness_id.cmp(&b.fitness_id))
        });
        Ok(matches)
    }
}
