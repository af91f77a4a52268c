//! Point-to-cell assignment and per-cell reduction.

use std::collections::{BTreeMap, BTreeSet};

use h3o::{CellIndex, LatLng, Resolution};
use works_map_permit_models::WorkPoint;

use crate::{AggregationResult, HexCell, PartitionTag, cell_boundary, sort_cells};

/// Per-cell accumulator while grouping points.
struct CellAccumulator {
    work_count: u64,
    permits: BTreeSet<String>,
    activity_types: BTreeSet<String>,
    sum_lat: f64,
    sum_lng: f64,
}

/// Assigns each point to its enclosing cell at `resolution` and reduces
/// per-cell statistics.
///
/// An empty point sequence is a valid outcome ("nothing to show for this
/// partition") and produces an empty result, not an error. Points whose
/// coordinates H3 rejects are skipped and logged; the extraction stage
/// filters those upstream, so this is a backstop.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(
    points: &[WorkPoint],
    resolution: Resolution,
    partition: PartitionTag,
) -> AggregationResult {
    let mut groups: BTreeMap<CellIndex, CellAccumulator> = BTreeMap::new();

    for point in points {
        let Ok(coord) = LatLng::new(point.lat, point.lng) else {
            log::warn!(
                "Skipping permit {}: H3 rejected coordinates ({}, {})",
                point.permit_reference,
                point.lat,
                point.lng
            );
            continue;
        };
        let index = coord.to_cell(resolution);

        let group = groups.entry(index).or_insert_with(|| CellAccumulator {
            work_count: 0,
            permits: BTreeSet::new(),
            activity_types: BTreeSet::new(),
            sum_lat: 0.0,
            sum_lng: 0.0,
        });
        group.work_count += 1;
        group.permits.insert(point.permit_reference.clone());
        group.activity_types.insert(point.activity_type.clone());
        group.sum_lat += point.lat;
        group.sum_lng += point.lng;
    }

    let mut cells: Vec<HexCell> = groups
        .into_iter()
        .map(|(index, group)| {
            let count = group.work_count as f64;
            HexCell {
                index,
                work_count: group.work_count,
                unique_permits: group.permits.len() as u64,
                activity_types: group.activity_types,
                center_lat: group.sum_lat / count,
                center_lng: group.sum_lng / count,
                boundary: cell_boundary(index),
            }
        })
        .collect();

    sort_cells(&mut cells);

    AggregationResult {
        resolution,
        partition,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, permit: &str, activity: &str) -> WorkPoint {
        WorkPoint {
            lat,
            lng,
            permit_reference: permit.to_string(),
            activity_type: activity.to_string(),
        }
    }

    fn tag() -> PartitionTag {
        PartitionTag {
            authority: "NEWCASTLE CITY COUNCIL".to_string(),
            month: "06_2025".to_string(),
            categories: BTreeSet::new(),
        }
    }

    #[test]
    fn empty_input_is_an_empty_result_not_an_error() {
        let result = aggregate(&[], Resolution::Nine, tag());
        assert!(result.cells.is_empty());
        assert_eq!(result.resolution, Resolution::Nine);
    }

    #[test]
    fn groups_points_by_cell_and_reduces_statistics() {
        // Two records at the same works location (one permit logged under
        // two activity types) and a third far away.
        let points = [
            point(54.9714, -1.6135, "P1", "Utility repair"),
            point(54.9714, -1.6135, "P1", "Core sampling"),
            point(54.9060, -1.3800, "P2", "Utility repair"),
        ];
        let result = aggregate(&points, Resolution::Nine, tag());

        assert_eq!(result.cells.len(), 2);

        let busiest = &result.cells[0];
        assert_eq!(busiest.work_count, 2);
        assert_eq!(busiest.unique_permits, 1);
        assert_eq!(
            busiest.activity_types,
            BTreeSet::from(["Utility repair".to_string(), "Core sampling".to_string()])
        );
        assert!((busiest.center_lat - 54.9714).abs() < 1e-9);
        assert!((busiest.center_lng - -1.6135).abs() < 1e-9);

        let other = &result.cells[1];
        assert_eq!(other.work_count, 1);
        assert_eq!(other.unique_permits, 1);
    }

    #[test]
    fn sample_centroid_is_the_mean_of_contributing_points() {
        // Pick two distinct points inside the same cell: the cell center
        // and a contributing point, so their mean is strictly between.
        let seed = LatLng::new(54.9714, -1.6135).unwrap();
        let index = seed.to_cell(Resolution::Seven);
        let center = LatLng::from(index);

        let points = [
            point(seed.lat(), seed.lng(), "P1", "Utility repair"),
            point(center.lat(), center.lng(), "P2", "Utility repair"),
        ];
        let result = aggregate(&points, Resolution::Seven, tag());

        assert_eq!(result.cells.len(), 1);
        let cell = &result.cells[0];
        let expected_lat = f64::midpoint(seed.lat(), center.lat());
        let expected_lng = f64::midpoint(seed.lng(), center.lng());
        assert!((cell.center_lat - expected_lat).abs() < 1e-12);
        assert!((cell.center_lng - expected_lng).abs() < 1e-12);
    }

    #[test]
    fn sample_centroid_differs_from_cell_center_in_general() {
        let seed = LatLng::new(54.9714, -1.6135).unwrap();
        let index = seed.to_cell(Resolution::Six);
        let center = LatLng::from(index);

        let points = [point(seed.lat(), seed.lng(), "P1", "Utility repair")];
        let result = aggregate(&points, Resolution::Six, tag());

        let cell = &result.cells[0];
        let off_center = (cell.center_lat - center.lat()).abs() > 1e-9
            || (cell.center_lng - center.lng()).abs() > 1e-9;
        assert!(off_center, "sample centroid should track the points, not the cell");
    }

    #[test]
    fn output_is_ordered_by_work_count_then_index() {
        let points = [
            point(54.9714, -1.6135, "P1", "a"),
            point(54.9060, -1.3800, "P2", "a"),
            point(54.9060, -1.3800, "P3", "a"),
            point(55.0100, -1.4400, "P4", "a"),
        ];
        let result = aggregate(&points, Resolution::Nine, tag());

        assert_eq!(result.cells.len(), 3);
        assert_eq!(result.cells[0].work_count, 2);
        // The two singleton cells tie on count and must come out in
        // ascending index order.
        assert_eq!(result.cells[1].work_count, 1);
        assert_eq!(result.cells[2].work_count, 1);
        assert!(result.cells[1].index < result.cells[2].index);
    }

    #[test]
    fn boundary_matches_standalone_computation() {
        let points = [point(54.9714, -1.6135, "P1", "a")];
        let result = aggregate(&points, Resolution::Nine, tag());
        let cell = &result.cells[0];
        assert_eq!(cell.boundary, crate::cell_boundary(cell.index));
    }
}
