//! Representative point extraction.
//!
//! Each normalized geometry collapses to a single coordinate for hex
//! assignment: lines and multi-lines use their centroid, points and
//! multi-points likewise (a point's centroid is itself).

use works_map_permit_models::WorkPoint;

use crate::{GeometryError, NormalizedWorkRecord, WorkGeometry};

/// Reduces a geometry to its representative point.
///
/// # Errors
///
/// Returns [`GeometryError::Empty`] when the geometry has no well-defined
/// centroid (e.g. a degenerate zero-length line).
pub fn representative_point(geometry: &WorkGeometry) -> Result<geo::Point<f64>, GeometryError> {
    geometry.centroid().ok_or(GeometryError::Empty)
}

/// Whether a longitude/latitude pair is inside the valid geographic range.
#[must_use]
pub fn in_geographic_range(lng: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)
}

/// Extracts one [`WorkPoint`] per record.
///
/// Records whose representative point falls outside the valid geographic
/// range are dropped and logged, not errored: out-of-range coordinates in
/// otherwise-valid rows are sensor noise.
#[must_use]
pub fn extract_points(records: &[NormalizedWorkRecord]) -> Vec<WorkPoint> {
    let mut points = Vec::with_capacity(records.len());

    for record in records {
        let point = match representative_point(&record.geometry) {
            Ok(point) => point,
            Err(e) => {
                log::warn!(
                    "Skipping permit {}: no representative point ({e})",
                    record.permit_reference
                );
                continue;
            }
        };

        if !in_geographic_range(point.x(), point.y()) {
            log::warn!(
                "Skipping permit {}: representative point ({}, {}) out of range",
                record.permit_reference,
                point.y(),
                point.x()
            );
            continue;
        }

        points.push(WorkPoint {
            lat: point.y(),
            lng: point.x(),
            permit_reference: record.permit_reference.clone(),
            activity_type: record.activity_type.clone(),
        });
    }

    points
}
