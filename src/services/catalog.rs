// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout catalog client.
//!
//! The catalog is a static JSON list of workouts served over HTTP. Lookups
//! match names case-insensitively. The fetched list is cached for a
//! configurable time to avoid downloading it for every added workout.

use crate::error::{AppError, Result};
use crate::models::WorkoutBaseline;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Lookup of workout baselines by name.
#[async_trait]
pub trait WorkoutCatalog: Send + Sync {
    /// Find the workout whose name matches `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no workout has that name
    /// - `UpstreamUnavailable` if the catalog cannot be fetched
    async fn lookup(&self, name: &str) -> Result<WorkoutBaseline>;
}

/// Find a workout by case-insensitive exact name.
pub fn find_in_catalog<'a>(entries: &'a [WorkoutBaseline], name: &str) -> Option<&'a WorkoutBaseline> {
    let wanted = name.trim().to_lowercase();
    entries
        .iter()
        .find(|entry| entry.workout_name.to_lowercase() == wanted)
}

struct CachedCatalog {
    entries: Arc<Vec<WorkoutBaseline>>,
    fetched_at: Instant,
}

/// Catalog served as a JSON array over HTTP.
#[derive(Clone)]
pub struct HttpWorkoutCatalog {
    http: reqwest::Client,
    url: String,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<CachedCatalog>>>,
}

impl HttpWorkoutCatalog {
    /// Create a catalog client with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration, cache_ttl: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            cache_ttl,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Drop the cached list so the next lookup refetches it.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Return the catalog, from cache when still fresh.
    async fn entries(&self) -> Result<Arc<Vec<WorkoutBaseline>>> {
        if !self.cache_ttl.is_zero() {
            if let Some(cached) = self.cache.read().await.as_ref() {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(cached.entries.clone());
                }
            }
        }

        let entries = Arc::new(self.fetch().await?);

        if !self.cache_ttl.is_zero() {
            *self.cache.write().await = Some(CachedCatalog {
                entries: entries.clone(),
                fetched_at: Instant::now(),
            });
        }

        Ok(entries)
    }

    async fn fetch(&self) -> Result<Vec<WorkoutBaseline>> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamUnavailable("Catalog request timed out".to_string())
            } else {
                AppError::UpstreamUnavailable(format!("Catalog request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(status = status.as_u16(), url = %self.url, "Catalog returned error status");
            return Err(AppError::UpstreamUnavailable(format!(
                "Catalog returned HTTP {}",
                status
            )));
        }

        let entries: Vec<WorkoutBaseline> = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Catalog JSON parse error: {}", e)))?;

        tracing::debug!(count = entries.len(), "Fetched workout catalog");
        Ok(entries)
    }
}

#[async_trait]
impl WorkoutCatalog for HttpWorkoutCatalog {
    async fn lookup(&self, name: &str) -> Result<WorkoutBaseline> {
        let entries = self.entries().await?;
        let found = find_in_catalog(&entries, name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workout '{}' not found in catalog", name)))?;

        if !found.calories_burned.is_finite() || found.calories_burned < 0.0 {
            return Err(AppError::UpstreamUnavailable(format!(
                "Catalog entry '{}' has invalid calories",
                found.workout_name
            )));
        }

        Ok(found)
    }
}
