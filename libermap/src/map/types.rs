//! Layer and view types shared with the map collaborator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::coord::{Coordinate, Projection};
use crate::kml::Feature;
use crate::style::StyleFunction;

/// Opaque identity of a layer attached to a [`super::MapView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u64);

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Where a layer's content comes from.
#[derive(Debug, Clone)]
pub enum LayerSource {
    /// Parsed features drawn with a style function.
    Vector {
        features: Arc<Vec<Feature>>,
        style: StyleFunction,
    },
    /// Externally rendered WMS raster. `url` carries the GetMap query.
    Wms { url: String },
    /// Slippy-map tiles.
    Xyz {
        url_template: String,
        attribution: String,
    },
    /// Layers rendered together, in order.
    Group(Vec<MapLayer>),
}

#[derive(Debug, Clone)]
pub struct MapLayer {
    pub source: LayerSource,
    pub visible: bool,
    /// Stacking order. Basemaps sit below zero, overlays at zero.
    pub z_index: i32,
}

impl MapLayer {
    pub fn vector(features: Arc<Vec<Feature>>, style: StyleFunction) -> Self {
        Self {
            source: LayerSource::Vector { features, style },
            visible: true,
            z_index: 0,
        }
    }

    pub fn wms(url: impl Into<String>) -> Self {
        Self {
            source: LayerSource::Wms { url: url.into() },
            visible: true,
            z_index: 0,
        }
    }

    pub fn xyz(url_template: impl Into<String>, attribution: impl Into<String>, z_index: i32) -> Self {
        Self {
            source: LayerSource::Xyz {
                url_template: url_template.into(),
                attribution: attribution.into(),
            },
            visible: true,
            z_index,
        }
    }

    pub fn group(layers: Vec<MapLayer>, z_index: i32) -> Self {
        Self {
            source: LayerSource::Group(layers),
            visible: true,
            z_index,
        }
    }

    /// Features of a vector layer.
    pub fn features(&self) -> Option<&Arc<Vec<Feature>>> {
        match &self.source {
            LayerSource::Vector { features, .. } => Some(features),
            _ => None,
        }
    }
}

/// Web Mercator ground resolution at zoom 0 for 256px tiles (m/px).
pub const RESOLUTION_Z0: f64 = 156_543.033_928_040_97;

/// Current camera of the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub center: Coordinate,
    pub zoom: f64,
    /// Radians, clockwise
    pub rotation: f64,
    pub projection: Projection,
}

impl ViewState {
    /// Map units per pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        let base = match self.projection {
            Projection::Wgs84 => 360.0 / 256.0,
            Projection::WebMercator | Projection::Hk1980Grid => RESOLUTION_Z0,
        };
        base / 2f64.powf(self.zoom)
    }
}

/// Animated camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnimation {
    pub center: Coordinate,
    pub zoom: f64,
    pub duration: Duration,
}

/// Single-instance overlay markers. Markers render above every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerSlot {
    /// Temporary pin for a search result
    Search,
    /// Device position
    Location,
}
