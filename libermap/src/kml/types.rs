//! Parsed feature types.

use thiserror::Error;

use crate::coord::{CoordError, Coordinate, Extent};

/// Errors raised while reading a KML document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KmlError {
    /// The XML itself is malformed
    #[error("Malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// Document root is not `<kml>`
    #[error("Not a KML document (root element '{0}')")]
    NotKml(String),

    /// A `<coordinates>` tuple could not be read
    #[error("Invalid coordinate tuple '{0}'")]
    InvalidCoordinate(String),

    /// Geometry element without usable coordinates
    #[error("Invalid {0} geometry: {1}")]
    InvalidGeometry(&'static str, String),

    /// Coordinate could not be projected into the view
    #[error("Reprojection failed: {0}")]
    Projection(#[from] CoordError),
}

/// Feature geometry, already in the view projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Outer ring first, then holes
    Polygon(Vec<Vec<Coordinate>>),
    /// `<MultiGeometry>`
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Bounding box of every vertex, or `None` for an empty collection.
    pub fn extent(&self) -> Option<Extent> {
        let mut out: Option<Extent> = None;
        self.for_each_vertex(&mut |c| match out.as_mut() {
            Some(e) => e.extend(c),
            None => out = Some(Extent::from_point(c)),
        });
        out
    }

    /// True when the geometry is a point or a collection of points.
    pub fn is_point_like(&self) -> bool {
        match self {
            Geometry::Point(_) => true,
            Geometry::Collection(parts) => {
                !parts.is_empty() && parts.iter().all(Geometry::is_point_like)
            }
            _ => false,
        }
    }

    fn for_each_vertex(&self, f: &mut impl FnMut(Coordinate)) {
        match self {
            Geometry::Point(c) => f(*c),
            Geometry::LineString(cs) => cs.iter().copied().for_each(&mut *f),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().for_each(&mut *f),
            Geometry::Collection(parts) => {
                for part in parts {
                    part.for_each_vertex(&mut *f);
                }
            }
        }
    }
}

/// One `<Placemark>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub name: Option<String>,
    /// HTML description shown in the popup
    pub description: Option<String>,
    /// `<ExtendedData>` values in document order
    pub properties: Vec<(String, String)>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Look up an extended-data value by name.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Combined bounding box of a feature set.
pub fn features_extent(features: &[Feature]) -> Option<Extent> {
    features
        .iter()
        .filter_map(|f| f.geometry.as_ref().and_then(Geometry::extent))
        .reduce(|mut acc, e| {
            acc.merge(&e);
            acc
        })
}
