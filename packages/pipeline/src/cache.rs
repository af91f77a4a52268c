//! Explicit cache of partition aggregation results.
//!
//! Owns a mapping from partition key to (result, fetch time) with explicit
//! invalidation. Nothing in the pipeline memoizes implicitly; embedding
//! applications decide when a cached partition is stale.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use h3o::Resolution;
use works_map_hex::AggregationResult;
use works_map_permit_models::WorkCategory;

use crate::PartitionRequest;

/// Identity of one cached partition aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Authority label the partition was queried for.
    pub authority: String,
    /// Month partition identifier.
    pub month: String,
    /// Categories the partition was filtered to.
    pub categories: BTreeSet<WorkCategory>,
    /// Resolution the aggregation was computed at.
    pub resolution: u8,
}

impl CacheKey {
    /// Builds the key for a partition request.
    #[must_use]
    pub fn for_request(
        request: &PartitionRequest,
        categories: &BTreeSet<WorkCategory>,
        resolution: Resolution,
    ) -> Self {
        Self {
            authority: request.authority.label().to_string(),
            month: request.month.clone(),
            categories: categories.clone(),
            resolution: u8::from(resolution),
        }
    }
}

/// A cached aggregation with the time its underlying data was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAggregation {
    /// The cached result.
    pub result: AggregationResult,
    /// When the partition was fetched from the store.
    pub fetched_at: DateTime<Utc>,
}

/// Thread-safe partition result cache.
#[derive(Debug, Default)]
pub struct AggregationCache {
    entries: Mutex<HashMap<CacheKey, CachedAggregation>>,
}

impl AggregationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CachedAggregation> {
        self.lock().get(key).cloned()
    }

    /// Stores a result under `key`, stamped with the current time.
    pub fn insert(&self, key: CacheKey, result: AggregationResult) {
        self.lock().insert(
            key,
            CachedAggregation {
                result,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Removes one entry; returns whether it existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Clears the whole cache.
    pub fn invalidate_all(&self) {
        self.lock().clear();
    }

    /// Number of cached partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CachedAggregation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
