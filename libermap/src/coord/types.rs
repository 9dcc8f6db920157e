//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Coordinate reference systems understood by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// Geographic longitude/latitude on WGS84 (EPSG:4326).
    Wgs84,
    /// Spherical Web Mercator metres (EPSG:3857), the view projection.
    #[default]
    WebMercator,
    /// Hong Kong 1980 Grid System metres (EPSG:2326).
    Hk1980Grid,
}

impl Projection {
    /// EPSG code string for this projection.
    pub fn code(&self) -> &'static str {
        match self {
            Projection::Wgs84 => "EPSG:4326",
            Projection::WebMercator => "EPSG:3857",
            Projection::Hk1980Grid => "EPSG:2326",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Projection {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:4326" | "WGS84" => Ok(Projection::Wgs84),
            "EPSG:3857" | "EPSG:900913" => Ok(Projection::WebMercator),
            "EPSG:2326" | "HK80" => Ok(Projection::Hk1980Grid),
            other => Err(CoordError::UnknownProjection(other.to_string())),
        }
    }
}

/// A planar or geographic coordinate pair.
///
/// For [`Projection::Wgs84`] `x` is longitude and `y` is latitude, both in
/// degrees. For the projected systems both are metres (easting, northing).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a geographic coordinate from longitude and latitude.
    pub const fn lon_lat(lon: f64, lat: f64) -> Self {
        Self { x: lon, y: lat }
    }

    /// Planar distance to another coordinate in the same projection.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

/// Axis-aligned bounding box in a single projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// An extent covering a single point.
    pub fn from_point(c: Coordinate) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Grow to include `c`.
    pub fn extend(&mut self, c: Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    /// Grow to include another extent.
    pub fn merge(&mut self, other: &Extent) {
        self.extend(Coordinate::new(other.min_x, other.min_y));
        self.extend(Coordinate::new(other.max_x, other.max_y));
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// Same extent grown by `margin` on every side.
    pub fn buffered(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Coordinate component is NaN or infinite
    NonFinite,
    /// Projection code not recognised
    UnknownProjection(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::NonFinite => write!(f, "Coordinate contains NaN or infinite value"),
            CoordError::UnknownProjection(code) => {
                write!(f, "Unknown projection '{}'", code)
            }
        }
    }
}

impl std::error::Error for CoordError {}
