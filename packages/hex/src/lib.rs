#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hexagonal spatial aggregation of street-works points.
//!
//! Representative points are assigned to H3 cells at a caller-chosen
//! resolution and reduced to per-cell statistics. Each (authority x month)
//! partition aggregates independently; [`merge`] recombines partition
//! results without re-touching raw points.
//!
//! Cell assignment is a pure function of `(lat, lng, resolution)` and a
//! cell's boundary polygon is a pure function of its index, which is what
//! makes the partition merge safe: any two partitions that produce the
//! same cell index are guaranteed to agree on its boundary.

mod aggregate;
pub mod geojson;
mod merge;
pub mod resolution;
pub mod summary;

use std::collections::BTreeSet;

use h3o::{CellIndex, Resolution};
use works_map_permit_models::WorkCategory;

pub use aggregate::aggregate;
pub use merge::{MergedAggregation, merge};

/// Errors from hex aggregation and merging.
#[derive(Debug, thiserror::Error)]
pub enum HexError {
    /// Aggregations at different resolutions cannot be merged by any
    /// arithmetic; they can only be re-derived from raw points.
    #[error("cannot merge aggregations at different resolutions: expected {expected}, got {actual}")]
    ResolutionMismatch {
        /// Resolution of the first input.
        expected: Resolution,
        /// The mismatching resolution.
        actual: Resolution,
    },

    /// [`merge`] needs at least one input to know the target resolution.
    #[error("cannot merge zero aggregation results")]
    NothingToMerge,
}

/// One hex cell with aggregated work statistics.
///
/// `center_lat`/`center_lng` are the sample centroid of the contributing
/// points, which generally differs from the cell's geometric center: it
/// shows where work actually clustered within the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    /// H3 cell index.
    pub index: CellIndex,
    /// Number of contributing records.
    pub work_count: u64,
    /// Count of distinct permit references among contributing records.
    pub unique_permits: u64,
    /// Union of activity-type labels among contributing records.
    pub activity_types: BTreeSet<String>,
    /// Mean latitude of contributing points.
    pub center_lat: f64,
    /// Mean longitude of contributing points.
    pub center_lng: f64,
    /// Closed hexagon boundary, a pure function of the cell index.
    pub boundary: geo::Polygon<f64>,
}

impl HexCell {
    /// The cell index in its canonical string form.
    #[must_use]
    pub fn index_string(&self) -> String {
        self.index.to_string()
    }

    /// The resolution this cell belongs to.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.index.resolution()
    }
}

/// Identifying attributes of the partition an aggregation came from, kept
/// for merge bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTag {
    /// Highway authority the partition was queried for.
    pub authority: String,
    /// Month partition identifier (`MM_YYYY`).
    pub month: String,
    /// Normalized categories the partition was filtered to; empty means
    /// no category filter.
    pub categories: BTreeSet<WorkCategory>,
}

/// Aggregated hex cells from one partition, ordered by `work_count`
/// descending with ties broken by ascending cell index.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    /// Resolution every cell in this result was computed at.
    pub resolution: Resolution,
    /// Where this result came from.
    pub partition: PartitionTag,
    /// The aggregated cells.
    pub cells: Vec<HexCell>,
}

/// Computes a cell's closed boundary polygon from its index alone.
#[must_use]
pub fn cell_boundary(index: CellIndex) -> geo::Polygon<f64> {
    let boundary = index.boundary();
    let mut ring: Vec<geo::Coord<f64>> = boundary
        .iter()
        .map(|vertex| geo::coord! { x: vertex.lng(), y: vertex.lat() })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    geo::Polygon::new(geo::LineString::from(ring), Vec::new())
}

/// Orders cells by descending `work_count`, ties by ascending cell index.
pub(crate) fn sort_cells(cells: &mut [HexCell]) {
    cells.sort_by(|a, b| {
        b.work_count
            .cmp(&a.work_count)
            .then_with(|| a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use h3o::LatLng;

    use super::*;

    #[test]
    fn cell_assignment_is_deterministic() {
        let coord = LatLng::new(54.9714, -1.6135).unwrap();
        let a = coord.to_cell(Resolution::Nine);
        let b = LatLng::new(54.9714, -1.6135).unwrap().to_cell(Resolution::Nine);
        assert_eq!(a, b);
    }

    #[test]
    fn boundary_is_a_pure_function_of_the_index() {
        let index = LatLng::new(54.9714, -1.6135)
            .unwrap()
            .to_cell(Resolution::Eight);
        assert_eq!(cell_boundary(index), cell_boundary(index));
    }

    #[test]
    fn boundary_ring_is_closed() {
        let index = LatLng::new(54.9714, -1.6135)
            .unwrap()
            .to_cell(Resolution::Nine);
        let boundary = cell_boundary(index);
        let ring = boundary.exterior();
        assert!(ring.is_closed());
        // Hexagons have 6 vertices plus the closing one.
        assert_eq!(ring.coords().count(), 7);
    }
}
