//! Streaming KML reader built on quick-xml.
//!
//! Only the subset that LiberData publishes is understood: placemarks with
//! name, description, extended data and Point/LineString/Polygon/MultiGeometry
//! geometry. Styles embedded in the document are ignored; overlays are drawn
//! with the viewer's own style function.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use super::types::{Feature, Geometry, KmlError};
use crate::coord::{self, Coordinate, Projection};

/// Geometry under construction.
enum Frame {
    Point(Option<Coordinate>),
    Line(Vec<Coordinate>),
    Ring(Vec<Coordinate>),
    Polygon(Vec<Vec<Coordinate>>),
    Collection(Vec<Geometry>),
}

struct ParseState {
    target: Projection,
    path: Vec<String>,
    text: String,
    placemark: Option<Feature>,
    frames: Vec<Frame>,
    data_name: Option<String>,
    features: Vec<Feature>,
}

/// Parse a KML document, reprojecting coordinates into `target`.
///
/// The document is rejected as a whole on the first error; no partial
/// feature list is ever returned.
pub fn parse_kml(text: &str, target: Projection) -> Result<Vec<Feature>, KmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut state = ParseState {
        target,
        path: Vec::new(),
        text: String::new(),
        placemark: None,
        frames: Vec::new(),
        data_name: None,
        features: Vec::new(),
    };
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| KmlError::Xml {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                if !saw_root {
                    check_root(&name)?;
                    saw_root = true;
                }
                state.start(&name, &e)?;
                state.path.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                if !saw_root {
                    check_root(&name)?;
                    saw_root = true;
                }
                // Self-closing elements carry no text or children
                state.start(&name, &e)?;
                state.path.push(name.clone());
                state.end(&name)?;
                state.path.pop();
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                state.end(&name)?;
                state.path.pop();
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|e| KmlError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                state.text.push_str(&unescaped);
            }
            Event::CData(c) => {
                state.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(KmlError::NotKml(String::new()));
    }
    if let Some(open) = state.path.last() {
        return Err(KmlError::Xml {
            position: reader.buffer_position() as u64,
            message: format!("unexpected end of document inside <{}>", open),
        });
    }

    debug!(features = state.features.len(), "KML parsed");
    Ok(state.features)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn check_root(name: &str) -> Result<(), KmlError> {
    if name == "kml" {
        Ok(())
    } else {
        Err(KmlError::NotKml(name.to_string()))
    }
}

impl ParseState {
    fn start(&mut self, name: &str, e: &BytesStart<'_>) -> Result<(), KmlError> {
        self.text.clear();
        match name {
            "Placemark" => self.placemark = Some(Feature::default()),
            "Point" => self.frames.push(Frame::Point(None)),
            "LineString" => self.frames.push(Frame::Line(Vec::new())),
            "LinearRing" => self.frames.push(Frame::Ring(Vec::new())),
            "Polygon" => self.frames.push(Frame::Polygon(Vec::new())),
            "MultiGeometry" => self.frames.push(Frame::Collection(Vec::new())),
            "Data" | "SimpleData" => {
                self.data_name = e
                    .try_get_attribute("name")
                    .ok()
                    .flatten()
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), KmlError> {
        let text = std::mem::take(&mut self.text);
        // `path` still contains `name` itself; the element above it is at len - 2
        let enclosing = self
            .path
            .len()
            .checked_sub(2)
            .and_then(|i| self.path.get(i))
            .map(String::as_str);

        match name {
            "name" if enclosing == Some("Placemark") => {
                if let Some(pm) = self.placemark.as_mut() {
                    pm.name = non_empty(text);
                }
            }
            "description" if enclosing == Some("Placemark") => {
                if let Some(pm) = self.placemark.as_mut() {
                    pm.description = non_empty(text);
                }
            }
            "value" if enclosing == Some("Data") => {
                if let (Some(pm), Some(key)) = (self.placemark.as_mut(), self.data_name.clone()) {
                    pm.properties.push((key, text));
                }
            }
            "SimpleData" => {
                if let (Some(pm), Some(key)) = (self.placemark.as_mut(), self.data_name.take()) {
                    pm.properties.push((key, text));
                }
            }
            "Data" => self.data_name = None,
            "coordinates" => {
                let coords = self.parse_coordinates(&text)?;
                match self.frames.last_mut() {
                    Some(Frame::Point(slot)) => *slot = coords.first().copied(),
                    Some(Frame::Line(v)) | Some(Frame::Ring(v)) => *v = coords,
                    _ => trace!("coordinates outside geometry ignored"),
                }
            }
            "LinearRing" => {
                let ring = match self.frames.pop() {
                    Some(Frame::Ring(ring)) => ring,
                    _ => return Err(KmlError::InvalidGeometry("LinearRing", "unbalanced".into())),
                };
                if ring.len() < 3 {
                    return Err(KmlError::InvalidGeometry(
                        "LinearRing",
                        format!("{} vertices", ring.len()),
                    ));
                }
                match self.frames.last_mut() {
                    Some(Frame::Polygon(rings)) if enclosing == Some("outerBoundaryIs") => {
                        rings.insert(0, ring)
                    }
                    Some(Frame::Polygon(rings)) => rings.push(ring),
                    _ => trace!("LinearRing outside Polygon ignored"),
                }
            }
            "Point" | "LineString" | "Polygon" | "MultiGeometry" => {
                let geometry = match self.frames.pop() {
                    Some(Frame::Point(Some(c))) => Geometry::Point(c),
                    Some(Frame::Point(None)) => {
                        return Err(KmlError::InvalidGeometry("Point", "no coordinates".into()))
                    }
                    Some(Frame::Line(v)) if v.len() >= 2 => Geometry::LineString(v),
                    Some(Frame::Line(v)) => {
                        return Err(KmlError::InvalidGeometry(
                            "LineString",
                            format!("{} vertices", v.len()),
                        ))
                    }
                    Some(Frame::Polygon(rings)) if !rings.is_empty() => Geometry::Polygon(rings),
                    Some(Frame::Polygon(_)) => {
                        return Err(KmlError::InvalidGeometry("Polygon", "no rings".into()))
                    }
                    Some(Frame::Collection(parts)) => Geometry::Collection(parts),
                    _ => return Err(KmlError::InvalidGeometry("geometry", "unbalanced".into())),
                };
                match self.frames.last_mut() {
                    Some(Frame::Collection(parts)) => parts.push(geometry),
                    _ => {
                        if let Some(pm) = self.placemark.as_mut() {
                            pm.geometry = Some(geometry);
                        }
                    }
                }
            }
            "Placemark" => {
                if let Some(pm) = self.placemark.take() {
                    self.features.push(pm);
                }
                self.frames.clear();
            }
            _ => {}
        }

        Ok(())
    }

    fn parse_coordinates(&self, text: &str) -> Result<Vec<Coordinate>, KmlError> {
        text.split_whitespace()
            .map(|tuple| {
                let mut parts = tuple.split(',');
                let lon = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
                let lat = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
                match (lon, lat) {
                    (Some(lon), Some(lat)) => Ok(coord::from_lon_lat(
                        Coordinate::lon_lat(lon, lat),
                        self.target,
                    )?),
                    _ => Err(KmlError::InvalidCoordinate(tuple.to_string())),
                }
            })
            .collect()
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
