//! Merge of independently aggregated partition results.
//!
//! The merge is a commutative, associative reduction over cell index, so
//! partition results can be folded in any order or grouping, including a
//! parallel tree-reduction.

use std::collections::BTreeMap;

use h3o::{CellIndex, Resolution};

use crate::{AggregationResult, HexCell, HexError, PartitionTag, sort_cells};

/// Per-cell accumulator carrying coordinate sums so the merged sample
/// centroid stays the mean over all contributing points regardless of
/// fold order.
#[derive(Debug, Clone)]
struct MergedCell {
    work_count: u64,
    unique_permits: u64,
    activity_types: std::collections::BTreeSet<String>,
    weighted_lat: f64,
    weighted_lng: f64,
    boundary: geo::Polygon<f64>,
}

/// Hex cells combined from one or more partitions at the same resolution.
///
/// `unique_permits` is summed across partitions, not deduplicated: a
/// permit spanning two months counts once per month. Within one partition
/// the count is exact; across partitions it is a documented upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAggregation {
    /// Resolution of every contributing result.
    pub resolution: Resolution,
    /// Partitions that contributed, in arrival order.
    pub partitions: Vec<PartitionTag>,
    /// Merged cells, ordered by `work_count` descending with ties broken
    /// by ascending cell index.
    pub cells: Vec<HexCell>,
}

impl From<AggregationResult> for MergedAggregation {
    fn from(result: AggregationResult) -> Self {
        Self {
            resolution: result.resolution,
            partitions: vec![result.partition],
            cells: result.cells,
        }
    }
}

impl MergedAggregation {
    /// Combines two merged aggregations; the monoid operation behind
    /// [`merge`].
    ///
    /// # Errors
    ///
    /// Returns [`HexError::ResolutionMismatch`] if the two sides were
    /// aggregated at different resolutions.
    pub fn combine(self, other: Self) -> Result<Self, HexError> {
        if self.resolution != other.resolution {
            return Err(HexError::ResolutionMismatch {
                expected: self.resolution,
                actual: other.resolution,
            });
        }

        let mut by_index: BTreeMap<CellIndex, MergedCell> = BTreeMap::new();
        for cell in self.cells.into_iter().chain(other.cells) {
            absorb(&mut by_index, cell);
        }

        let mut partitions = self.partitions;
        partitions.extend(other.partitions);

        let mut cells: Vec<HexCell> = by_index.into_iter().map(finish).collect();
        sort_cells(&mut cells);

        Ok(Self {
            resolution: self.resolution,
            partitions,
            cells,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn absorb(by_index: &mut BTreeMap<CellIndex, MergedCell>, cell: HexCell) {
    let weight = cell.work_count as f64;
    match by_index.entry(cell.index) {
        std::collections::btree_map::Entry::Vacant(entry) => {
            entry.insert(MergedCell {
                work_count: cell.work_count,
                unique_permits: cell.unique_permits,
                activity_types: cell.activity_types,
                weighted_lat: cell.center_lat * weight,
                weighted_lng: cell.center_lng * weight,
                boundary: cell.boundary,
            });
        }
        std::collections::btree_map::Entry::Occupied(mut entry) => {
            let merged = entry.get_mut();
            merged.work_count += cell.work_count;
            // Summed, not deduplicated across partitions.
            merged.unique_permits += cell.unique_permits;
            merged.activity_types.extend(cell.activity_types);
            merged.weighted_lat += cell.center_lat * weight;
            merged.weighted_lng += cell.center_lng * weight;
            // The boundary is a pure function of the index, so the one
            // already stored is identical to `cell.boundary`.
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn finish((index, merged): (CellIndex, MergedCell)) -> HexCell {
    let weight = merged.work_count.max(1) as f64;
    HexCell {
        index,
        work_count: merged.work_count,
        unique_permits: merged.unique_permits,
        activity_types: merged.activity_types,
        center_lat: merged.weighted_lat / weight,
        center_lng: merged.weighted_lng / weight,
        boundary: merged.boundary,
    }
}

/// Merges partition results produced at the same resolution into one
/// consistent cell set.
///
/// # Errors
///
/// Returns [`HexError::NothingToMerge`] for an empty input and
/// [`HexError::ResolutionMismatch`] if the inputs disagree on resolution.
pub fn merge(results: Vec<AggregationResult>) -> Result<MergedAggregation, HexError> {
    let mut iter = results.into_iter().map(MergedAggregation::from);
    let first = iter.next().ok_or(HexError::NothingToMerge)?;
    iter.try_fold(first, MergedAggregation::combine)
}
