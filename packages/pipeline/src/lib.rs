#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Partition orchestration for the street-works aggregation pipeline.
//!
//! Each (authority x month) partition runs fetch -> normalize -> extract
//! -> aggregate independently, with no shared mutable state, so partitions
//! fan out concurrently bounded only by the store's connection budget. The
//! merge at the end is the sole synchronization point.

pub mod cache;

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt as _};
use h3o::Resolution;
use works_map_database::{DbError, WorkEventStore};
use works_map_geometry::{GeometryError, NormalizedBatch, normalize_batch, points::extract_points};
use works_map_hex::{AggregationResult, HexError, MergedAggregation, PartitionTag, aggregate, merge};
use works_map_permit_models::{CategoryFilter, WorkCategory};

pub use works_map_database::AuthorityFilter;

/// Errors from running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Query layer failure, passed through unchanged.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Batch-level geometry failure.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Merge failure (caller error, e.g. mixed resolutions).
    #[error(transparent)]
    Hex(#[from] HexError),
}

/// One independent query unit: an authority scope and a month partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRequest {
    /// Authority scope of the query.
    pub authority: AuthorityFilter,
    /// Month partition identifier (`MM_YYYY`).
    pub month: String,
}

fn partition_tag(request: &PartitionRequest, categories: &BTreeSet<WorkCategory>) -> PartitionTag {
    PartitionTag {
        authority: request.authority.label().to_string(),
        month: request.month.clone(),
        categories: categories.clone(),
    }
}

/// Runs one partition end to end: fetch, normalize, extract, aggregate.
///
/// An empty partition is surfaced as a warning and produces an explicitly
/// empty aggregation rather than aborting sibling partitions.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] for store failures, propagated unchanged.
pub async fn run_partition(
    store: &dyn WorkEventStore,
    request: &PartitionRequest,
    categories: &BTreeSet<WorkCategory>,
    resolution: Resolution,
) -> Result<AggregationResult, PipelineError> {
    let filter = CategoryFilter::compile(categories);
    let rows = store.fetch(&request.authority, &request.month, &filter).await?;
    let tag = partition_tag(request, categories);

    let batch = match normalize_batch(rows) {
        Ok(batch) => batch,
        Err(GeometryError::EmptyInput) => {
            log::warn!(
                "No permit records for {} in {} with the selected filters",
                tag.authority,
                tag.month
            );
            return Ok(aggregate(&[], resolution, tag));
        }
        Err(e) => return Err(e.into()),
    };

    let points = extract_points(&batch.records);
    Ok(aggregate(&points, resolution, tag))
}

/// Runs many partitions concurrently, bounded by `concurrency`.
///
/// Results arrive in completion order; that is fine because the merge
/// reduction is commutative.
///
/// # Errors
///
/// Returns the first partition error encountered. Dropping the returned
/// future abandons all in-flight partitions.
pub async fn run_partitions(
    store: &dyn WorkEventStore,
    requests: &[PartitionRequest],
    categories: &BTreeSet<WorkCategory>,
    resolution: Resolution,
    concurrency: usize,
) -> Result<Vec<AggregationResult>, PipelineError> {
    let results: Vec<Result<AggregationResult, PipelineError>> = stream::iter(
        requests
            .iter()
            .map(|request| run_partition(store, request, categories, resolution)),
    )
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    results.into_iter().collect()
}

/// Runs many partitions and merges them into one cell set.
///
/// # Errors
///
/// Returns partition errors, or [`HexError::NothingToMerge`] when called
/// with no requests.
pub async fn run_and_merge(
    store: &dyn WorkEventStore,
    requests: &[PartitionRequest],
    categories: &BTreeSet<WorkCategory>,
    resolution: Resolution,
    concurrency: usize,
) -> Result<MergedAggregation, PipelineError> {
    let results = run_partitions(store, requests, categories, resolution, concurrency).await?;
    Ok(merge(results)?)
}

/// Fetches and normalizes one partition without hex aggregation, for the
/// points/lines display mode.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] for store failures. An empty partition
/// is a warning plus an empty batch, same as the hex path.
pub async fn fetch_normalized(
    store: &dyn WorkEventStore,
    request: &PartitionRequest,
    categories: &BTreeSet<WorkCategory>,
) -> Result<NormalizedBatch, PipelineError> {
    let filter = CategoryFilter::compile(categories);
    let rows = store.fetch(&request.authority, &request.month, &filter).await?;

    match normalize_batch(rows) {
        Ok(batch) => Ok(batch),
        Err(GeometryError::EmptyInput) => {
            log::warn!(
                "No permit records for {} in {} with the selected filters",
                request.authority.label(),
                request.month
            );
            Ok(NormalizedBatch {
                records: Vec::new(),
                skipped: 0,
            })
        }
        Err(e) => Err(e.into()),
    }
}
