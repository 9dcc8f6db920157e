//! Hong Kong 1980 Grid System (EPSG:2326).
//!
//! Transverse Mercator on the International 1924 ellipsoid. Conversion to
//! WGS84 uses the Lands Department's published geodetic offsets
//! (latitude −5.5″, longitude +8.8″), which is accurate to about a metre
//! across the territory.

use std::f64::consts::PI;

/// International 1924 semi-major axis (m).
const A: f64 = 6_378_388.0;
/// International 1924 flattening.
const F: f64 = 1.0 / 297.0;

/// Projection origin latitude (22°18′43.68″N).
pub const ORIGIN_LAT: f64 = 22.312_133_333_333_33;
/// Projection origin longitude (114°10′42.80″E).
pub const ORIGIN_LON: f64 = 114.178_555_555_555_6;
/// False easting (m).
pub const FALSE_EASTING: f64 = 836_694.05;
/// False northing (m).
pub const FALSE_NORTHING: f64 = 819_069.8;
const SCALE: f64 = 1.0;

/// HK80 geodetic → WGS84 latitude offset (degrees).
const WGS84_LAT_SHIFT: f64 = -5.5 / 3600.0;
/// HK80 geodetic → WGS84 longitude offset (degrees).
const WGS84_LON_SHIFT: f64 = 8.8 / 3600.0;

fn e2() -> f64 {
    2.0 * F - F * F
}

fn meridian_arc(phi: f64) -> f64 {
    let e2 = e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Project HK80 geodetic latitude/longitude (degrees) to grid easting/northing.
pub fn geodetic_to_grid(lat: f64, lon: f64) -> (f64, f64) {
    let e2 = e2();
    let ep2 = e2 / (1.0 - e2);
    let phi = lat.to_radians();
    let phi0 = ORIGIN_LAT.to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = (lon - ORIGIN_LON).to_radians() * cos_phi;

    let m = meridian_arc(phi);
    let m0 = meridian_arc(phi0);

    let x = SCALE
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
    let y = SCALE
        * (m - m0
            + n * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                        / 720.0));

    (FALSE_EASTING + x, FALSE_NORTHING + y)
}

/// Inverse projection: grid easting/northing to HK80 geodetic (lat, lon) in degrees.
pub fn grid_to_geodetic(easting: f64, northing: f64) -> (f64, f64) {
    let e2 = e2();
    let ep2 = e2 / (1.0 - e2);
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    let m = meridian_arc(ORIGIN_LAT.to_radians()) + (northing - FALSE_NORTHING) / SCALE;
    let mu = m / (A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_term = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_term) / (1.0 + sqrt_term);

    // Footpoint latitude
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin1 = phi1.sin();
    let cos1 = phi1.cos();
    let tan1 = phi1.tan();

    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let denom = 1.0 - e2 * sin1 * sin1;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - e2) / denom.powf(1.5);
    let d = (easting - FALSE_EASTING) / (n1 * SCALE);

    let phi = phi1
        - (n1 * tan1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lambda = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / cos1;

    (phi * 180.0 / PI, ORIGIN_LON + lambda * 180.0 / PI)
}

/// Grid easting/northing to WGS84 (lon, lat) degrees.
pub fn grid_to_wgs84(easting: f64, northing: f64) -> (f64, f64) {
    let (lat, lon) = grid_to_geodetic(easting, northing);
    (lon + WGS84_LON_SHIFT, lat + WGS84_LAT_SHIFT)
}

/// WGS84 (lon, lat) degrees to grid easting/northing.
pub fn wgs84_to_grid(lon: f64, lat: f64) -> (f64, f64) {
    geodetic_to_grid(lat - WGS84_LAT_SHIFT, lon - WGS84_LON_SHIFT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_origin() {
        let (e, n) = geodetic_to_grid(ORIGIN_LAT, ORIGIN_LON);
        assert!((e - FALSE_EASTING).abs() < 1e-6);
        assert!((n - FALSE_NORTHING).abs() < 1e-6);
    }

    #[test]
    fn test_grid_origin_in_wgs84() {
        let (lon, lat) = grid_to_wgs84(FALSE_EASTING, FALSE_NORTHING);
        assert!((lat - 22.310_605_56).abs() < 1e-6, "lat was {}", lat);
        assert!((lon - 114.181_000_0).abs() < 1e-6, "lon was {}", lon);
    }

    #[test]
    fn test_forward_inverse_agree() {
        for &(e, n) in &[
            (835_000.0, 816_000.0),
            (820_000.0, 830_000.0),
            (845_500.0, 812_250.0),
        ] {
            let (lon, lat) = grid_to_wgs84(e, n);
            let (e2, n2) = wgs84_to_grid(lon, lat);
            assert!((e - e2).abs() < 0.01, "easting drift at ({}, {})", e, n);
            assert!((n - n2).abs() < 0.01, "northing drift at ({}, {})", e, n);
        }
    }

    #[test]
    fn test_central_district_location() {
        // A grid point in Central, Hong Kong Island
        let (lon, lat) = grid_to_wgs84(835_000.0, 816_000.0);
        assert!((lat - 22.283).abs() < 0.005, "lat was {}", lat);
        assert!((lon - 114.165).abs() < 0.005, "lon was {}", lon);
    }
}
