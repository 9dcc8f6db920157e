//! KML feature parsing.

mod parser;
mod types;

pub use parser::parse_kml;
pub use types::{features_extent, Feature, Geometry, KmlError};
