//! Headline statistics over an aggregated cell set.

use serde::Serialize;

use crate::HexCell;

/// Summary metrics for an aggregated or merged grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    /// Number of distinct cells.
    pub total_cells: usize,
    /// Total contributing records across all cells.
    pub total_works: u64,
    /// Mean records per cell; zero for an empty grid.
    pub mean_works_per_cell: f64,
    /// Largest record count in any single cell.
    pub max_works: u64,
}

/// Computes headline metrics over a cell set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(cells: &[HexCell]) -> GridSummary {
    let total_works: u64 = cells.iter().map(|cell| cell.work_count).sum();
    let max_works = cells.iter().map(|cell| cell.work_count).max().unwrap_or(0);
    let mean_works_per_cell = if cells.is_empty() {
        0.0
    } else {
        total_works as f64 / cells.len() as f64
    };

    GridSummary {
        total_cells: cells.len(),
        total_works,
        mean_works_per_cell,
        max_works,
    }
}

/// The `n` most active cells. Relies on the ordering invariant of
/// aggregation output (descending `work_count`).
#[must_use]
pub fn top_cells(cells: &[HexCell], n: usize) -> &[HexCell] {
    &cells[..cells.len().min(n)]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use h3o::{LatLng, Resolution};
    use works_map_permit_models::WorkPoint;

    use super::*;
    use crate::{PartitionTag, aggregate};

    fn points_at(lat: f64, lng: f64, count: usize) -> Vec<WorkPoint> {
        (0..count)
            .map(|i| WorkPoint {
                lat,
                lng,
                permit_reference: format!("P{i}"),
                activity_type: "Utility repair".to_string(),
            })
            .collect()
    }

    #[test]
    fn summarizes_an_aggregated_grid() {
        let mut points = points_at(54.9714, -1.6135, 3);
        points.extend(points_at(54.9060, -1.3800, 1));

        let result = aggregate(
            &points,
            Resolution::Nine,
            PartitionTag {
                authority: "ALL".to_string(),
                month: "06_2025".to_string(),
                categories: BTreeSet::new(),
            },
        );
        let summary = summarize(&result.cells);

        assert_eq!(summary.total_cells, 2);
        assert_eq!(summary.total_works, 4);
        assert_eq!(summary.max_works, 3);
        assert!((summary.mean_works_per_cell - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_grid_summarizes_to_zeroes() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_cells, 0);
        assert_eq!(summary.total_works, 0);
        assert_eq!(summary.max_works, 0);
        assert!((summary.mean_works_per_cell).abs() < f64::EPSILON);
    }

    #[test]
    fn top_cells_clamps_to_available() {
        let seed = LatLng::new(54.9714, -1.6135).unwrap();
        let index = seed.to_cell(Resolution::Nine);
        let cell = crate::HexCell {
            index,
            work_count: 1,
            unique_permits: 1,
            activity_types: BTreeSet::new(),
            center_lat: seed.lat(),
            center_lng: seed.lng(),
            boundary: crate::cell_boundary(index),
        };
        assert_eq!(top_cells(&[cell.clone()], 10).len(), 1);
        assert_eq!(top_cells(&[cell], 0).len(), 0);
    }
}
