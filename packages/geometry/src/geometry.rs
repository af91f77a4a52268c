//! Tagged geometry variant for permit works locations.
//!
//! Permit geometries are points, multi-points, lines, or multi-lines;
//! anything else in the source data is rejected. Keeping the kinds as an
//! enum gives each one its own centroid and conversion path instead of
//! open-ended type inspection.

use geo::{Centroid, CoordsIter, MapCoords, coord};
use wkt::Wkt;
use wkt::types::{Coord as WktCoord, LineString as WktLineString, Point as WktPoint};

use crate::GeometryError;
use crate::bng::osgb36_to_wgs84;

/// A works-location geometry, one of the four kinds permit data uses.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkGeometry {
    /// A single point.
    Point(geo::Point<f64>),
    /// A collection of points.
    MultiPoint(geo::MultiPoint<f64>),
    /// A single line.
    Line(geo::LineString<f64>),
    /// A collection of lines.
    MultiLine(geo::MultiLineString<f64>),
}

impl WorkGeometry {
    /// The centroid of this geometry; a point's centroid is itself.
    ///
    /// `None` only for degenerate cases such as a zero-length line.
    #[must_use]
    pub fn centroid(&self) -> Option<geo::Point<f64>> {
        match self {
            Self::Point(point) => Some(point.centroid()),
            Self::MultiPoint(points) => points.centroid(),
            Self::Line(line) => line.centroid(),
            Self::MultiLine(lines) => lines.centroid(),
        }
    }

    /// Short label for the geometry kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::MultiPoint(_) => "multi-point",
            Self::Line(_) => "line",
            Self::MultiLine(_) => "multi-line",
        }
    }

    /// Whether every coordinate of this geometry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let finite = |c: geo::Coord<f64>| c.x.is_finite() && c.y.is_finite();
        match self {
            Self::Point(point) => point.coords_iter().all(finite),
            Self::MultiPoint(points) => points.coords_iter().all(finite),
            Self::Line(line) => line.coords_iter().all(finite),
            Self::MultiLine(lines) => lines.coords_iter().all(finite),
        }
    }

    /// Reprojects every coordinate from British National Grid
    /// easting/northing to WGS84 longitude/latitude.
    #[must_use]
    pub fn reproject_to_wgs84(&self) -> Self {
        let project = |c: geo::Coord<f64>| {
            let (lon, lat) = osgb36_to_wgs84(c.x, c.y);
            coord! { x: lon, y: lat }
        };
        match self {
            Self::Point(point) => Self::Point(point.map_coords(project)),
            Self::MultiPoint(points) => Self::MultiPoint(points.map_coords(project)),
            Self::Line(line) => Self::Line(line.map_coords(project)),
            Self::MultiLine(lines) => Self::MultiLine(lines.map_coords(project)),
        }
    }
}

/// Removes the Z (and measure) ordinate from every coordinate tuple.
///
/// Only the four supported kinds are touched; the geometry kind is
/// preserved and only the dimensionality changes. Idempotent.
#[must_use]
pub fn strip_z(geometry: Wkt<f64>) -> Wkt<f64> {
    match geometry {
        Wkt::Point(point) => Wkt::Point(strip_point(point)),
        Wkt::MultiPoint(mut points) => {
            points.0 = points.0.into_iter().map(strip_point).collect();
            Wkt::MultiPoint(points)
        }
        Wkt::LineString(line) => Wkt::LineString(strip_line(line)),
        Wkt::MultiLineString(mut lines) => {
            lines.0 = lines.0.into_iter().map(strip_line).collect();
            Wkt::MultiLineString(lines)
        }
        other => other,
    }
}

fn strip_coord(coord: WktCoord<f64>) -> WktCoord<f64> {
    WktCoord {
        x: coord.x,
        y: coord.y,
        z: None,
        m: None,
    }
}

fn strip_point(point: WktPoint<f64>) -> WktPoint<f64> {
    WktPoint(point.0.map(strip_coord))
}

fn strip_line(line: WktLineString<f64>) -> WktLineString<f64> {
    WktLineString(line.0.into_iter().map(strip_coord).collect())
}

/// Parses a WKT string into a [`WorkGeometry`] in the source coordinate
/// system, stripping any Z ordinate.
///
/// # Errors
///
/// Returns [`GeometryError::Parse`] for unparsable text,
/// [`GeometryError::Empty`] for an empty geometry, and
/// [`GeometryError::UnsupportedKind`] for kinds permit data never uses
/// (polygons, collections).
pub fn geometry_from_wkt(wkt_text: &str) -> Result<WorkGeometry, GeometryError> {
    let parsed: Wkt<f64> = wkt_text.trim().parse().map_err(|e| GeometryError::Parse {
        message: format!("{e}"),
    })?;

    match strip_z(parsed) {
        Wkt::Point(point) => {
            let coord = point.0.ok_or(GeometryError::Empty)?;
            Ok(WorkGeometry::Point(geo::Point::new(coord.x, coord.y)))
        }
        Wkt::MultiPoint(points) => {
            let points: Vec<geo::Point<f64>> = points
                .0
                .into_iter()
                .filter_map(|p| p.0)
                .map(|c| geo::Point::new(c.x, c.y))
                .collect();
            if points.is_empty() {
                return Err(GeometryError::Empty);
            }
            Ok(WorkGeometry::MultiPoint(geo::MultiPoint(points)))
        }
        Wkt::LineString(line) => {
            if line.0.is_empty() {
                return Err(GeometryError::Empty);
            }
            Ok(WorkGeometry::Line(line_to_geo(&line)))
        }
        Wkt::MultiLineString(lines) => {
            let lines: Vec<geo::LineString<f64>> = lines
                .0
                .iter()
                .filter(|line| !line.0.is_empty())
                .map(line_to_geo)
                .collect();
            if lines.is_empty() {
                return Err(GeometryError::Empty);
            }
            Ok(WorkGeometry::MultiLine(geo::MultiLineString(lines)))
        }
        Wkt::Polygon(_) => Err(GeometryError::UnsupportedKind { kind: "polygon" }),
        Wkt::MultiPolygon(_) => Err(GeometryError::UnsupportedKind {
            kind: "multi-polygon",
        }),
        Wkt::GeometryCollection(_) => Err(GeometryError::UnsupportedKind {
            kind: "geometry collection",
        }),
    }
}

fn line_to_geo(line: &WktLineString<f64>) -> geo::LineString<f64> {
    geo::LineString::from(
        line.0
            .iter()
            .map(|c| coord! { x: c.x, y: c.y })
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_z_removes_third_ordinate_from_every_kind() {
        let cases = [
            ("POINT Z (429000 561000 12)", "POINT(429000 561000)"),
            (
                "LINESTRING Z (429000 561000 12, 429100 561100 13)",
                "LINESTRING(429000 561000,429100 561100)",
            ),
            (
                "MULTIPOINT Z ((429000 561000 12), (429100 561100 13))",
                "MULTIPOINT((429000 561000),(429100 561100))",
            ),
            (
                "MULTILINESTRING Z ((429000 561000 12, 429100 561100 13))",
                "MULTILINESTRING((429000 561000,429100 561100))",
            ),
        ];
        for (input, expected) in cases {
            let stripped = strip_z(input.parse::<Wkt<f64>>().unwrap());
            assert_eq!(stripped.to_string(), expected, "stripping {input}");
        }
    }

    #[test]
    fn strip_z_is_idempotent() {
        let wkt: Wkt<f64> = "LINESTRING Z (429000 561000 12, 429100 561100 13)"
            .parse()
            .unwrap();
        let once = strip_z(wkt);
        let twice = strip_z(once.clone());
        assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn parses_all_four_supported_kinds() {
        let cases = [
            ("POINT (429000 561000)", "point"),
            ("MULTIPOINT ((429000 561000), (429100 561100))", "multi-point"),
            ("LINESTRING (429000 561000, 429100 561100)", "line"),
            (
                "MULTILINESTRING ((429000 561000, 429100 561100), (429200 561200, 429300 561300))",
                "multi-line",
            ),
        ];
        for (wkt_text, kind) in cases {
            let geometry = geometry_from_wkt(wkt_text).unwrap();
            assert_eq!(geometry.kind(), kind);
        }
    }

    #[test]
    fn rejects_garbage_text() {
        assert!(matches!(
            geometry_from_wkt("not a geometry"),
            Err(GeometryError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_empty_geometries() {
        for wkt_text in ["POINT EMPTY", "LINESTRING EMPTY", "MULTIPOINT EMPTY"] {
            assert!(
                matches!(geometry_from_wkt(wkt_text), Err(GeometryError::Empty)),
                "{wkt_text} should be rejected as empty"
            );
        }
    }

    #[test]
    fn rejects_polygons() {
        let result =
            geometry_from_wkt("POLYGON ((429000 561000, 429100 561000, 429100 561100, 429000 561000))");
        assert!(matches!(
            result,
            Err(GeometryError::UnsupportedKind { kind: "polygon" })
        ));
    }

    #[test]
    fn line_centroid_is_midpoint_for_a_straight_segment() {
        let geometry = geometry_from_wkt("LINESTRING (0 0, 10 10)").unwrap();
        let centroid = geometry.centroid().unwrap();
        assert!((centroid.x() - 5.0).abs() < 1e-12);
        assert!((centroid.y() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn point_centroid_is_itself() {
        let geometry = geometry_from_wkt("POINT (429000 561000)").unwrap();
        let centroid = geometry.centroid().unwrap();
        assert_eq!(centroid, geo::Point::new(429_000.0, 561_000.0));
    }

    #[test]
    fn reprojection_keeps_the_geometry_kind() {
        let geometry =
            geometry_from_wkt("MULTILINESTRING ((429000 561000, 429100 561100))").unwrap();
        let reprojected = geometry.reproject_to_wgs84();
        assert_eq!(reprojected.kind(), "multi-line");
        assert!(reprojected.is_finite());
    }
}
