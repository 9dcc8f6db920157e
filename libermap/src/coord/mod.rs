//! Coordinate conversion module
//!
//! Converts between the three reference systems the viewer deals with:
//! WGS84 geographic degrees, the spherical Web Mercator view projection, and
//! the Hong Kong 1980 Grid used by government location data.

pub mod hk80;
mod types;

pub use types::{Coordinate, CoordError, Extent, Projection, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Web Mercator sphere radius (m).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Convert a WGS84 longitude/latitude to Web Mercator metres.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> Result<Coordinate, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }

    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Ok(Coordinate::new(x, y))
}

/// Convert Web Mercator metres back to WGS84 longitude/latitude.
#[inline]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> Coordinate {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Coordinate::lon_lat(lon, lat)
}

/// Express a coordinate as WGS84 longitude/latitude.
pub fn to_lon_lat(coord: Coordinate, from: Projection) -> Result<Coordinate, CoordError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(CoordError::NonFinite);
    }
    Ok(match from {
        Projection::Wgs84 => coord,
        Projection::WebMercator => mercator_to_lon_lat(coord.x, coord.y),
        Projection::Hk1980Grid => {
            let (lon, lat) = hk80::grid_to_wgs84(coord.x, coord.y);
            Coordinate::lon_lat(lon, lat)
        }
    })
}

/// Project a WGS84 longitude/latitude into `to`.
pub fn from_lon_lat(lon_lat: Coordinate, to: Projection) -> Result<Coordinate, CoordError> {
    if !lon_lat.x.is_finite() || !lon_lat.y.is_finite() {
        return Err(CoordError::NonFinite);
    }
    match to {
        Projection::Wgs84 => Ok(lon_lat),
        Projection::WebMercator => lon_lat_to_mercator(lon_lat.x, lon_lat.y),
        Projection::Hk1980Grid => {
            let (e, n) = hk80::wgs84_to_grid(lon_lat.x, lon_lat.y);
            Ok(Coordinate::new(e, n))
        }
    }
}

/// Reproject a coordinate between any two supported systems.
pub fn transform(
    coord: Coordinate,
    from: Projection,
    to: Projection,
) -> Result<Coordinate, CoordError> {
    if from == to {
        return Ok(coord);
    }
    from_lon_lat(to_lon_lat(coord, from)?, to)
}
