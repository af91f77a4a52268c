#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometry normalization for street-works permit records.
//!
//! Raw permit rows carry works locations as WKT in British National Grid
//! coordinates, sometimes with a Z ordinate. This crate parses them,
//! strips the elevation, reprojects to WGS84, attaches the normalized
//! work category, and reduces geometries to representative points for
//! hex aggregation.

pub mod bng;
pub mod geojson;
mod geometry;
pub mod points;

pub use geometry::{WorkGeometry, geometry_from_wkt, strip_z};
use works_map_permit_models::{RawWorkRecord, WorkCategory};

/// Errors from geometry parsing and normalization.
///
/// All variants except [`EmptyInput`](Self::EmptyInput) are per-record:
/// batch processing skips and logs them rather than aborting.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The record has no geometry field at all.
    #[error("record has no geometry")]
    Missing,

    /// The WKT text could not be parsed.
    #[error("failed to parse WKT geometry: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },

    /// The geometry parsed but contains no coordinates.
    #[error("geometry is empty")]
    Empty,

    /// The geometry is a kind permit data never uses.
    #[error("unsupported geometry kind: {kind}")]
    UnsupportedKind {
        /// Label of the offending kind.
        kind: &'static str,
    },

    /// The input batch itself was empty. An empty batch upstream almost
    /// always means a filter or query mistake, so it surfaces to the
    /// operator instead of silently producing an empty result.
    #[error("empty input batch: no records to normalize")]
    EmptyInput,
}

/// A permit record with a two-dimensional WGS84 geometry and a normalized
/// work category. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWorkRecord {
    /// Unique permit reference number.
    pub permit_reference: String,
    /// Free-text activity type label.
    pub activity_type: String,
    /// Raw work category value, kept for reporting.
    pub work_category: String,
    /// Normalized category label.
    pub category: WorkCategory,
    /// Work status reference.
    pub work_status: String,
    /// Event type.
    pub event_type: String,
    /// 2-D geometry, x = longitude, y = latitude.
    pub geometry: WorkGeometry,
}

/// Result of normalizing one batch of raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// Successfully normalized records.
    pub records: Vec<NormalizedWorkRecord>,
    /// Records skipped because their geometry was missing or invalid.
    pub skipped: usize,
}

/// Normalizes one raw record: parse WKT, strip Z, reproject to WGS84,
/// attach the normalized category.
///
/// # Errors
///
/// Returns [`GeometryError`] if the geometry is absent, unparsable,
/// empty, or of an unsupported kind.
///
/// # Panics
///
/// Panics if reprojection produces a non-finite coordinate; finite input
/// always reprojects to finite output, so this is an internal bug, not a
/// data error.
pub fn normalize(record: RawWorkRecord) -> Result<NormalizedWorkRecord, GeometryError> {
    let wkt_text = record.geometry_wkt.as_deref().ok_or(GeometryError::Missing)?;
    let geometry = geometry_from_wkt(wkt_text)?.reproject_to_wgs84();

    assert!(
        geometry.is_finite(),
        "reprojection produced non-finite coordinates for permit {}",
        record.permit_reference
    );

    let category = WorkCategory::from_raw(&record.work_category);

    Ok(NormalizedWorkRecord {
        permit_reference: record.permit_reference,
        activity_type: record.activity_type,
        work_category: record.work_category,
        category,
        work_status: record.work_status,
        event_type: record.event_type,
        geometry,
    })
}

/// Normalizes a batch of raw records, skipping and logging per-record
/// geometry failures.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyInput`] if the batch contains no records
/// at all.
pub fn normalize_batch(records: Vec<RawWorkRecord>) -> Result<NormalizedBatch, GeometryError> {
    if records.is_empty() {
        return Err(GeometryError::EmptyInput);
    }

    let total = records.len();
    let mut normalized = Vec::with_capacity(total);
    let mut skipped = 0_usize;

    for record in records {
        let permit_reference = record.permit_reference.clone();
        match normalize(record) {
            Ok(record) => normalized.push(record),
            Err(e) => {
                log::warn!("Skipping permit {permit_reference}: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::info!("Normalized {}/{total} records ({skipped} skipped)", normalized.len());
    }

    Ok(NormalizedBatch {
        records: normalized,
        skipped,
    })
}
