//! Device position capability.
//!
//! The viewer may run without one; "my location" then reports that
//! geolocation is unsupported.

use thiserror::Error;

use crate::coord::Coordinate;

/// Alert shown when no position source is available.
pub const UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported on this system.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// Source of the device's current WGS84 position.
pub trait Geolocator: Send + Sync {
    /// Current position as lon/lat.
    fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Fixed position, e.g. from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticGeolocator {
    position: Coordinate,
}

impl StaticGeolocator {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            position: Coordinate::lon_lat(lon, lat),
        }
    }
}

impl Geolocator for StaticGeolocator {
    fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.position)
    }
}
