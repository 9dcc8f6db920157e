//! Feature info popup.
//!
//! A click is hit-tested against the visible vector layers, topmost first.
//! The first feature under the cursor opens the popup.

use std::sync::Arc;

use crate::coord::Coordinate;
use crate::kml::{Feature, Geometry};
use crate::map::{LayerHandle, MapView};

/// Hit tolerance around the cursor, in pixels.
pub const HIT_TOLERANCE_PX: f64 = 5.0;

/// Attribute columns never shown in the properties table.
pub const EXCLUDED_COLUMNS: [&str; 4] = ["geometry", "GlobalID", "Shape__Are", "Shape__Len"];

/// A feature found under the cursor.
#[derive(Debug, Clone)]
pub struct FeatureHit {
    pub layer: LayerHandle,
    pub feature: Feature,
}

/// What the popup displays.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub position: Coordinate,
    pub title: Option<String>,
    /// Raw HTML from the feature's `description`
    pub description: Option<String>,
    pub rows: Vec<(String, String)>,
}

impl PopupContent {
    pub fn from_feature(feature: &Feature, position: Coordinate) -> Self {
        Self {
            position,
            title: feature.name.clone(),
            description: feature.description.clone().filter(|d| !d.trim().is_empty()),
            rows: properties_table(feature),
        }
    }
}

/// Property rows in document order, minus [`EXCLUDED_COLUMNS`].
pub fn properties_table(feature: &Feature) -> Vec<(String, String)> {
    feature
        .properties
        .iter()
        .filter(|(k, _)| !EXCLUDED_COLUMNS.contains(&k.as_str()))
        .cloned()
        .collect()
}

/// Topmost visible feature at `position` (view projection).
pub fn feature_at(map: &dyn MapView, position: Coordinate) -> Option<FeatureHit> {
    let tolerance = map.view().resolution() * HIT_TOLERANCE_PX;

    let mut handles = map.layer_handles();
    handles.reverse();
    for handle in handles {
        let Some(layer) = map.layer(handle) else {
            continue;
        };
        if !layer.visible {
            continue;
        }
        let Some(features) = layer.features() else {
            continue;
        };
        if let Some(feature) = hit_in(features, position, tolerance) {
            return Some(FeatureHit {
                layer: handle,
                feature: feature.clone(),
            });
        }
    }
    None
}

fn hit_in(features: &Arc<Vec<Feature>>, p: Coordinate, tolerance: f64) -> Option<&Feature> {
    // Later features draw on top.
    features.iter().rev().find(|f| {
        f.geometry
            .as_ref()
            .is_some_and(|g| geometry_hit(g, p, tolerance))
    })
}

fn geometry_hit(geometry: &Geometry, p: Coordinate, tolerance: f64) -> bool {
    match geometry {
        Geometry::Point(c) => c.distance_to(&p) <= tolerance,
        Geometry::LineString(line) => near_path(line, p, tolerance),
        Geometry::Polygon(rings) => {
            let Some(outer) = rings.first() else {
                return false;
            };
            if rings.iter().any(|r| near_path(r, p, tolerance)) {
                return true;
            }
            point_in_ring(outer, p) && !rings[1..].iter().any(|hole| point_in_ring(hole, p))
        }
        Geometry::Collection(parts) => parts.iter().any(|g| geometry_hit(g, p, tolerance)),
    }
}

fn near_path(path: &[Coordinate], p: Coordinate, tolerance: f64) -> bool {
    path.windows(2)
        .any(|w| segment_distance(w[0], w[1], p) <= tolerance)
}

fn segment_distance(a: Coordinate, b: Coordinate, p: Coordinate) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return a.distance_to(&p);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    Coordinate::new(a.x + t * dx, a.y + t * dy).distance_to(&p)
}

/// Even-odd ray cast.
fn point_in_ring(ring: &[Coordinate], p: Coordinate) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Popup visibility and content.
#[derive(Debug, Default)]
pub struct PopupState {
    content: Option<PopupContent>,
}

impl PopupState {
    /// Handle a map click. Returns the content now shown, if any.
    pub fn click(&mut self, map: &dyn MapView, position: Coordinate) -> Option<&PopupContent> {
        self.content =
            feature_at(map, position).map(|hit| PopupContent::from_feature(&hit.feature, position));
        self.content.as_ref()
    }

    pub fn close(&mut self) -> bool {
        self.content.take().is_some()
    }

    pub fn content(&self) -> Option<&PopupContent> {
        self.content.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Projection;
    use crate::map::{MapLayer, MemoryMapView};
    use crate::style::default_style;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(x0, y0),
            Coordinate::new(x0 + size, y0),
            Coordinate::new(x0 + size, y0 + size),
            Coordinate::new(x0, y0 + size),
            Coordinate::new(x0, y0),
        ]
    }

    fn feature(name: &str, geometry: Geometry) -> Feature {
        Feature {
            name: Some(name.to_string()),
            description: Some("<b>info</b>".to_string()),
            properties: vec![
                ("NAME".into(), name.into()),
                ("GlobalID".into(), "{abc}".into()),
                ("Shape__Are".into(), "12.5".into()),
                ("AREA_HA".into(), "3".into()),
            ],
            geometry: Some(geometry),
        }
    }

    fn map() -> MemoryMapView {
        // ~0.15 m/px at zoom 20, tolerance under a metre
        MemoryMapView::new(Coordinate::new(0.0, 0.0), 20.0, Projection::WebMercator)
    }

    #[test]
    fn test_table_excludes_system_columns() {
        let f = feature("Park", Geometry::Point(Coordinate::new(0.0, 0.0)));
        let rows = properties_table(&f);
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["NAME", "AREA_HA"]);
    }

    #[test]
    fn test_polygon_hit_respects_holes() {
        let poly = Geometry::Polygon(vec![square(0.0, 0.0, 100.0), square(40.0, 40.0, 20.0)]);
        assert!(geometry_hit(&poly, Coordinate::new(10.0, 10.0), 0.5));
        assert!(!geometry_hit(&poly, Coordinate::new(50.0, 50.0), 0.5));
        assert!(!geometry_hit(&poly, Coordinate::new(150.0, 50.0), 0.5));
        // On the outer edge counts as a hit.
        assert!(geometry_hit(&poly, Coordinate::new(100.3, 50.0), 0.5));
    }

    #[test]
    fn test_topmost_visible_layer_wins() {
        let mut map = map();
        let bottom = map.add_layer(MapLayer::vector(
            Arc::new(vec![feature("bottom", Geometry::Polygon(vec![square(0.0, 0.0, 100.0)]))]),
            default_style,
        ));
        let top = map.add_layer(MapLayer::vector(
            Arc::new(vec![feature("top", Geometry::Polygon(vec![square(0.0, 0.0, 100.0)]))]),
            default_style,
        ));

        let hit = feature_at(&map, Coordinate::new(10.0, 10.0)).unwrap();
        assert_eq!(hit.layer, top);

        map.set_visible(top, false);
        let hit = feature_at(&map, Coordinate::new(10.0, 10.0)).unwrap();
        assert_eq!(hit.layer, bottom);
        assert_eq!(hit.feature.name.as_deref(), Some("bottom"));
    }

    #[test]
    fn test_click_opens_and_misses_close() {
        let mut map = map();
        map.add_layer(MapLayer::vector(
            Arc::new(vec![feature("pier", Geometry::Point(Coordinate::new(5.0, 5.0)))]),
            default_style,
        ));
        let mut popup = PopupState::default();

        let content = popup.click(&map, Coordinate::new(5.2, 5.0)).unwrap();
        assert_eq!(content.title.as_deref(), Some("pier"));
        assert_eq!(content.description.as_deref(), Some("<b>info</b>"));
        assert!(popup.is_open());

        assert!(popup.click(&map, Coordinate::new(500.0, 500.0)).is_none());
        assert!(!popup.is_open());
        assert!(!popup.close());
    }
}
