// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! The daily aggregate manager only talks to [`DocumentStore`]; Firestore is
//! the production implementation and [`InMemoryStore`] backs local runs and tests.

pub mod firestore;
pub mod in_memory;

pub use firestore::FirestoreDb;
pub use in_memory::InMemoryStore;

use crate::error::Result;
use crate::models::DailyAggregate;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Collection names as constants.
pub mod collections {
    /// Daily aggregates (keyed by `{user_id}_{date}`)
    pub const DAILY_AGGREGATES: &str = "daily_aggregates";
}

/// Persistence for daily aggregates.
///
/// Implementations must:
/// - assign `fitness_id` on the first save and keep it on later saves
/// - bump `version` on every successful save
/// - reject a save whose `version` differs from the stored one with `AppError::Conflict`
/// - reject a first save when a document for the same user and day already exists
///   with `AppError::Conflict`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist an aggregate and return it as stored.
    async fn save(&self, aggregate: &DailyAggregate) -> Result<DailyAggregate>;

    async fn find_by_id(&self, fitness_id: &str) -> Result<Option<DailyAggregate>>;

    /// Aggregates for `user_id` whose date is in `[start, end)`, oldest first.
    async fn find_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>>;
}

/// Document ID for the aggregate of `user_id` on `date`.
///
/// Deriving the ID from the natural key makes a second aggregate for the same
/// user and day collide at the store instead of silently coexisting.
pub fn aggregate_document_id(user_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", urlencoding::encode(user_id), date.format("%Y-%m-%d"))
}
