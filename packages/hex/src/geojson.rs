//! GeoJSON export of hex cells for the rendering layer.

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value, json};

use crate::HexCell;

/// Converts hex cells into a GeoJSON feature collection, one polygon
/// feature per cell with the aggregated statistics as properties.
#[must_use]
pub fn feature_collection(cells: &[HexCell]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: cells.iter().map(feature).collect(),
        foreign_members: None,
    }
}

fn feature(cell: &HexCell) -> Feature {
    let mut properties = Map::new();
    properties.insert("h3Cell".to_string(), Value::String(cell.index_string()));
    properties.insert("workCount".to_string(), json!(cell.work_count));
    properties.insert("uniquePermits".to_string(), json!(cell.unique_permits));
    properties.insert(
        "activityTypes".to_string(),
        Value::Array(
            cell.activity_types
                .iter()
                .map(|activity| Value::String(activity.clone()))
                .collect(),
        ),
    );
    properties.insert("centerLat".to_string(), json!(cell.center_lat));
    properties.insert("centerLng".to_string(), json!(cell.center_lng));
    properties.insert(
        "resolution".to_string(),
        json!(u8::from(cell.resolution())),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&cell.boundary))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
