//! Descriptive resolution table for caller-side UI.
//!
//! Purely informational: the core only ever passes the resolution through
//! to cell assignment.

use h3o::Resolution;
use serde::Serialize;

/// Approximate cell size and a human description for one H3 resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionInfo {
    /// The H3 resolution level.
    pub resolution: u8,
    /// Approximate average hexagon edge length in kilometres.
    pub avg_edge_km: f64,
    /// Human-readable description of what the level is good for.
    pub description: &'static str,
}

/// The resolutions offered for street-works analysis, coarse to fine.
pub const RESOLUTION_TABLE: &[ResolutionInfo] = &[
    ResolutionInfo {
        resolution: 6,
        avg_edge_km: 3.23,
        description: "Regional (~3.2km) - Good for city-wide patterns",
    },
    ResolutionInfo {
        resolution: 7,
        avg_edge_km: 1.22,
        description: "District (~1.2km) - Ideal for area analysis",
    },
    ResolutionInfo {
        resolution: 8,
        avg_edge_km: 0.46,
        description: "Locality (~460m) - Standard resolution",
    },
    ResolutionInfo {
        resolution: 9,
        avg_edge_km: 0.17,
        description: "Neighborhood (~170m) - Detailed view",
    },
    ResolutionInfo {
        resolution: 10,
        avg_edge_km: 0.065,
        description: "Block (~65m) - High detail",
    },
    ResolutionInfo {
        resolution: 11,
        avg_edge_km: 0.025,
        description: "Street (~25m) - Maximum detail",
    },
];

/// Looks up the descriptive entry for a resolution, if one exists.
#[must_use]
pub fn resolution_info(resolution: Resolution) -> Option<&'static ResolutionInfo> {
    let level = u8::from(resolution);
    RESOLUTION_TABLE.iter().find(|info| info.resolution == level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_coarse_to_fine() {
        for pair in RESOLUTION_TABLE.windows(2) {
            assert!(pair[0].resolution < pair[1].resolution);
            assert!(pair[0].avg_edge_km > pair[1].avg_edge_km);
        }
    }

    #[test]
    fn lookup_covers_the_offered_range() {
        assert!(resolution_info(Resolution::Nine).is_some());
        assert!(resolution_info(Resolution::Zero).is_none());
        assert_eq!(
            resolution_info(Resolution::Eight).unwrap().avg_edge_km,
            0.46
        );
    }
}
