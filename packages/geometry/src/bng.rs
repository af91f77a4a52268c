//! British National Grid (EPSG:27700) to WGS84 coordinate transform.
//!
//! Permit geometries arrive as eastings/northings on the Ordnance Survey
//! National Grid. The transform runs in two stages: the inverse transverse
//! Mercator projection onto the Airy 1830 ellipsoid, then the standard
//! 7-parameter Helmert shift from the OSGB36 datum to WGS84. Both stages
//! follow the Ordnance Survey's published formulae and are accurate to a
//! few metres, which is far below the size of any hex cell this system
//! aggregates into.

/// Airy 1830 semi-major axis (metres).
const AIRY_A: f64 = 6_377_563.396;
/// Airy 1830 semi-minor axis (metres).
const AIRY_B: f64 = 6_356_256.909;
/// WGS84 semi-major axis (metres).
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// National Grid central meridian scale factor.
const F0: f64 = 0.999_601_271_7;
/// True origin latitude (49°N), radians.
const PHI0: f64 = 49.0 * DEG;
/// True origin longitude (2°W), radians.
const LAMBDA0: f64 = -2.0 * DEG;
/// False easting of the true origin (metres).
const E0: f64 = 400_000.0;
/// False northing of the true origin (metres).
const N0: f64 = -100_000.0;

const DEG: f64 = std::f64::consts::PI / 180.0;
const ARCSEC: f64 = DEG / 3600.0;

/// OSGB36 -> WGS84 Helmert parameters (inverse of the published
/// WGS84 -> OSGB36 set): translations in metres, rotations in arcseconds,
/// scale in parts per million.
const HELMERT_TX: f64 = 446.448;
const HELMERT_TY: f64 = -125.157;
const HELMERT_TZ: f64 = 542.060;
const HELMERT_RX: f64 = 0.1502 * ARCSEC;
const HELMERT_RY: f64 = 0.2470 * ARCSEC;
const HELMERT_RZ: f64 = 0.8421 * ARCSEC;
const HELMERT_S: f64 = -20.4894e-6;

/// Converts a National Grid easting/northing to WGS84 `(longitude, latitude)`
/// in degrees.
#[must_use]
pub fn osgb36_to_wgs84(easting: f64, northing: f64) -> (f64, f64) {
    let (phi, lambda) = inverse_transverse_mercator(easting, northing);
    helmert_to_wgs84(phi, lambda)
}

/// Inverse transverse Mercator: easting/northing to latitude/longitude
/// (radians) on the Airy 1830 ellipsoid.
fn inverse_transverse_mercator(easting: f64, northing: f64) -> (f64, f64) {
    let e2 = 1.0 - (AIRY_B * AIRY_B) / (AIRY_A * AIRY_A);

    // Iterate the meridional arc until the residual is below 0.01mm.
    let mut phi = PHI0 + (northing - N0) / (AIRY_A * F0);
    loop {
        let m = meridional_arc(phi);
        let residual = northing - N0 - m;
        if residual.abs() < 1e-5 {
            break;
        }
        phi += residual / (AIRY_A * F0);
    }

    let sin_phi = phi.sin();
    let nu = AIRY_A * F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = AIRY_A * F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let tan_phi = phi.tan();
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;
    let tan6 = tan4 * tan2;
    let sec_phi = 1.0 / phi.cos();

    let vii = tan_phi / (2.0 * rho * nu);
    let viii =
        tan_phi / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
    let xii = sec_phi / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia =
        sec_phi / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

    let de = easting - E0;
    let de2 = de * de;
    let de3 = de2 * de;
    let de4 = de2 * de2;
    let de5 = de4 * de;
    let de6 = de4 * de2;
    let de7 = de6 * de;

    let lat = phi - vii * de2 + viii * de4 - ix * de6;
    let lon = LAMBDA0 + x * de - xi * de3 + xii * de5 - xiia * de7;
    (lat, lon)
}

/// Meridional arc length from the true origin to latitude `phi` (radians),
/// on the Airy 1830 ellipsoid scaled by `F0`.
fn meridional_arc(phi: f64) -> f64 {
    let n = (AIRY_A - AIRY_B) / (AIRY_A + AIRY_B);
    let n2 = n * n;
    let n3 = n2 * n;

    let dphi = phi - PHI0;
    let sphi = phi + PHI0;

    AIRY_B
        * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dphi
            - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dphi.sin() * sphi.cos()
            + (1.875 * n2 + 1.875 * n3) * (2.0 * dphi).sin() * (2.0 * sphi).cos()
            - (35.0 / 24.0) * n3 * (3.0 * dphi).sin() * (3.0 * sphi).cos())
}

/// Helmert datum shift from OSGB36 latitude/longitude (radians) to WGS84
/// `(longitude, latitude)` in degrees.
fn helmert_to_wgs84(phi: f64, lambda: f64) -> (f64, f64) {
    // Geodetic -> cartesian on Airy 1830, height zero.
    let e2_airy = 1.0 - (AIRY_B * AIRY_B) / (AIRY_A * AIRY_A);
    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let nu = AIRY_A / (1.0 - e2_airy * sin_phi * sin_phi).sqrt();

    let x = nu * cos_phi * lambda.cos();
    let y = nu * cos_phi * lambda.sin();
    let z = (1.0 - e2_airy) * nu * sin_phi;

    // 7-parameter Helmert transform (position vector convention).
    let m = 1.0 + HELMERT_S;
    let x2 = HELMERT_TX + m * x - HELMERT_RZ * y + HELMERT_RY * z;
    let y2 = HELMERT_TY + HELMERT_RZ * x + m * y - HELMERT_RX * z;
    let z2 = HELMERT_TZ - HELMERT_RY * x + HELMERT_RX * y + m * z;

    // Cartesian -> geodetic on WGS84, iterating latitude to convergence.
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let p = x2.hypot(y2);

    let mut lat = (z2 / (p * (1.0 - e2))).atan();
    loop {
        let sin_lat = lat.sin();
        let nu = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = ((z2 + e2 * nu * sin_lat) / p).atan();
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    let lon = y2.atan2(x2);

    (lon / DEG, lat / DEG)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ordnance Survey worked example: E 651409.903, N 313177.270 is
    /// 52°39'27.2531"N, 1°43'4.5177"E on OSGB36.
    #[test]
    fn inverse_projection_matches_os_worked_example() {
        let (lat, lon) = inverse_transverse_mercator(651_409.903, 313_177.270);
        let expected_lat = (52.0 + 39.0 / 60.0 + 27.2531 / 3600.0) * DEG;
        let expected_lon = (1.0 + 43.0 / 60.0 + 4.5177 / 3600.0) * DEG;
        assert!(
            (lat - expected_lat).abs() < 1e-8,
            "latitude off by {} rad",
            lat - expected_lat
        );
        assert!(
            (lon - expected_lon).abs() < 1e-8,
            "longitude off by {} rad",
            lon - expected_lon
        );
    }

    #[test]
    fn tyneside_grid_reference_lands_in_tyneside() {
        // A grid reference in central Newcastle upon Tyne.
        let (lon, lat) = osgb36_to_wgs84(429_000.0, 561_000.0);
        assert!((54.5..=55.3).contains(&lat), "latitude {lat} out of range");
        assert!((-2.0..=-1.1).contains(&lon), "longitude {lon} out of range");
    }

    #[test]
    fn datum_shift_is_small_but_nonzero() {
        let (phi, lambda) = inverse_transverse_mercator(429_000.0, 561_000.0);
        let (lon, lat) = helmert_to_wgs84(phi, lambda);
        let dlat = (lat - phi / DEG).abs();
        let dlon = (lon - lambda / DEG).abs();
        // OSGB36 and WGS84 graticules differ by roughly 50-120m in Great
        // Britain; a zero shift or a wild one both indicate a bug.
        assert!(dlat > 1e-5 && dlat < 5e-3, "latitude shift {dlat}");
        assert!(dlon > 1e-5 && dlon < 5e-3, "longitude shift {dlon}");
    }

    #[test]
    fn transform_is_deterministic() {
        let a = osgb36_to_wgs84(429_000.0, 561_000.0);
        let b = osgb36_to_wgs84(429_000.0, 561_000.0);
        assert_eq!(a, b);
    }
}
