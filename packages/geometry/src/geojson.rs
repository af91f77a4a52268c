//! GeoJSON export of normalized records for the points/lines display mode.

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value};

use crate::{NormalizedWorkRecord, WorkGeometry};

/// Converts normalized records into a GeoJSON feature collection, one
/// feature per record with the permit attributes as properties.
#[must_use]
pub fn feature_collection(records: &[NormalizedWorkRecord]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: records.iter().map(feature).collect(),
        foreign_members: None,
    }
}

fn feature(record: &NormalizedWorkRecord) -> Feature {
    let mut properties = Map::new();
    properties.insert(
        "permitReference".to_string(),
        Value::String(record.permit_reference.clone()),
    );
    properties.insert(
        "activityType".to_string(),
        Value::String(record.activity_type.clone()),
    );
    properties.insert(
        "workCategory".to_string(),
        Value::String(record.work_category.clone()),
    );
    properties.insert(
        "category".to_string(),
        Value::String(record.category.to_string()),
    );
    properties.insert(
        "workStatus".to_string(),
        Value::String(record.work_status.clone()),
    );
    properties.insert(
        "eventType".to_string(),
        Value::String(record.event_type.clone()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry_value(&record.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn geometry_value(geometry: &WorkGeometry) -> geojson::Value {
    match geometry {
        WorkGeometry::Point(point) => geojson::Value::from(point),
        WorkGeometry::MultiPoint(points) => geojson::Value::from(points),
        WorkGeometry::Line(line) => geojson::Value::from(line),
        WorkGeometry::MultiLine(lines) => geojson::Value::from(lines),
    }
}

#[cfg(test)]
mod tests {
    use works_map_permit_models::WorkCategory;

    use super::*;
    use crate::geometry_from_wkt;

    #[test]
    fn records_export_with_permit_properties() {
        let record = NormalizedWorkRecord {
            permit_reference: "PERMIT-042".to_string(),
            activity_type: "Remedial works".to_string(),
            work_category: "Immediate - urgent".to_string(),
            category: WorkCategory::Emergency,
            work_status: "completed".to_string(),
            event_type: "WORK_STOP".to_string(),
            geometry: geometry_from_wkt("POINT (-1.61 54.97)").unwrap(),
        };

        let collection = feature_collection(&[record]);
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["permitReference"], "PERMIT-042");
        assert_eq!(properties["category"], "Emergency");
        assert!(matches!(
            feature.geometry.as_ref().unwrap().value,
            geojson::Value::Point(_)
        ));
    }
}
