//! PNG export of the current view.
//!
//! Each basemap tile layer is fetched and stitched by `staticmap`; upper
//! layers (labels) are composited onto the bottom one in order. Visible
//! vector overlays are drawn on top as a custom [`Tool`] using their layer
//! style.
//! Rendering does blocking network and file I/O, so [`export`] moves it onto
//! the blocking pool.

use std::path::{Path, PathBuf};

use staticmap::tools::Tool;
use staticmap::{lat_to_y, lon_to_x, Bounds, StaticMapBuilder};
use thiserror::Error;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapMut, PixmapPaint, Shader, Stroke, Transform,
};
use tracing::{debug, info};

use crate::basemap::TileLayerConfig;
use crate::coord::{self, CoordError, Coordinate, Extent, Projection};
use crate::kml::Geometry;
use crate::map::{LayerSource, MapView};
use crate::style::{Rgba, Style};

pub const DEFAULT_PRINT_WIDTH: u32 = 800;
pub const DEFAULT_PRINT_HEIGHT: u32 = 600;
const MAX_PRINT_ZOOM: f64 = 19.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrintError {
    #[error("No basemap tile layer to print")]
    NoBasemap,

    #[error("Cannot convert view to longitude/latitude: {0}")]
    Projection(#[from] CoordError),

    #[error("Failed to render map: {0}")]
    Render(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Output size and location of exported maps.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_PRINT_WIDTH,
            height: DEFAULT_PRINT_HEIGHT,
            output_dir: PathBuf::from("."),
        }
    }
}

/// `map-export-<millis>.png`
pub fn export_file_name(timestamp_millis: i64) -> String {
    format!("map-export-{}.png", timestamp_millis)
}

/// Everything needed to render, detached from the live map.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub zoom: u8,
    /// View centre as lon/lat
    pub center: Coordinate,
    /// Basemap tile templates, bottom-most first
    pub url_templates: Vec<String>,
    pub overlays: OverlayTool,
}

impl PrintJob {
    /// Snapshot the view, basemap and visible overlays.
    pub fn prepare(
        map: &dyn MapView,
        basemap: &[TileLayerConfig],
        settings: &PrintOptions,
        timestamp_millis: i64,
    ) -> Result<Self, PrintError> {
        if basemap.is_empty() {
            return Err(PrintError::NoBasemap);
        }
        let view = map.view();
        let center = coord::to_lon_lat(view.center, view.projection)?;

        let mut overlays = OverlayTool::default();
        for handle in map.layer_handles() {
            let Some(layer) = map.layer(handle) else {
                continue;
            };
            if !layer.visible {
                continue;
            }
            if let LayerSource::Vector { features, style } = &layer.source {
                for feature in features.iter() {
                    if let Some(geometry) = &feature.geometry {
                        overlays.push(geometry, style(feature), view.projection)?;
                    }
                }
            }
        }

        Ok(Self {
            path: settings.output_dir.join(export_file_name(timestamp_millis)),
            width: settings.width,
            height: settings.height,
            zoom: view.zoom.round().clamp(0.0, MAX_PRINT_ZOOM) as u8,
            center,
            url_templates: basemap.iter().map(|l| l.concrete_template()).collect(),
            overlays,
        })
    }

    fn static_map(&self, url_template: &str) -> Result<staticmap::StaticMap, PrintError> {
        StaticMapBuilder::default()
            .width(self.width)
            .height(self.height)
            .zoom(self.zoom)
            .lat_center(self.center.y)
            .lon_center(self.center.x)
            .url_template(url_template)
            .build()
            .map_err(|e| PrintError::Render(e.to_string()))
    }

    /// Render and save the PNG. Blocks on tile downloads.
    pub fn render(self) -> Result<PathBuf, PrintError> {
        let (base, upper) = self
            .url_templates
            .split_first()
            .ok_or(PrintError::NoBasemap)?;
        let mut map = self.static_map(base)?;

        for template in upper {
            let png = self
                .static_map(template)?
                .encode_png()
                .map_err(|e| PrintError::Render(e.to_string()))?;
            let pixmap = Pixmap::decode_png(&png).map_err(|e| PrintError::Render(e.to_string()))?;
            map.add_tool(RasterTool {
                pixmap,
                center: self.center,
            });
        }

        debug!(
            basemap_layers = self.url_templates.len(),
            shapes = self.overlays.len(),
            zoom = self.zoom,
            "Rendering print"
        );
        map.add_tool(self.overlays);

        map.save_png(&self.path).map_err(|e| PrintError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        info!(path = %self.path.display(), "Map exported");
        Ok(self.path)
    }
}

/// Render `job` on the blocking pool.
pub async fn export(job: PrintJob) -> Result<PathBuf, PrintError> {
    tokio::task::spawn_blocking(move || job.render())
        .await
        .map_err(|e| PrintError::Render(format!("print task failed: {}", e)))?
}

/// Ensure the output directory exists.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PrintError> {
    std::fs::create_dir_all(dir).map_err(|e| PrintError::Write {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })
}

/// A pre-rendered basemap layer the size of the output, drawn over the
/// bottom layer.
struct RasterTool {
    pixmap: Pixmap,
    center: Coordinate,
}

impl Tool for RasterTool {
    fn extent(&self, _zoom: u8, _tile_size: f64) -> (f64, f64, f64, f64) {
        (self.center.x, self.center.y, self.center.x, self.center.y)
    }

    fn draw(&self, _bounds: &Bounds, mut pixmap: PixmapMut) {
        pixmap.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::default(),
            None,
        );
    }
}

/// One styled shape in lon/lat.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Circle {
        center: (f64, f64),
        radius: f32,
        fill: Option<Rgba>,
        stroke: Option<(Rgba, f32)>,
    },
    Path {
        rings: Vec<Vec<(f64, f64)>>,
        closed: bool,
        fill: Option<Rgba>,
        stroke: Option<(Rgba, f32)>,
    },
}

/// staticmap tool drawing vector overlays.
#[derive(Debug, Clone, Default)]
pub struct OverlayTool {
    shapes: Vec<Shape>,
    extent: Option<Extent>,
}

impl OverlayTool {
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Bounding box of all shapes, lon/lat.
    pub fn lon_lat_extent(&self) -> Option<Extent> {
        self.extent
    }

    fn push(&mut self, geometry: &Geometry, style: Style, from: Projection) -> Result<(), CoordError> {
        let fill = style.fill.map(|f| f.color);
        let stroke = style.stroke.map(|s| (s.color, s.width));

        match geometry {
            Geometry::Point(c) => {
                let p = self.to_lon_lat(*c, from)?;
                let circle = style.image;
                self.shapes.push(Shape::Circle {
                    center: p,
                    radius: circle.map(|c| c.radius).unwrap_or(5.0),
                    fill: circle.and_then(|c| c.fill).map(|f| f.color).or(fill),
                    stroke: circle
                        .and_then(|c| c.stroke)
                        .map(|s| (s.color, s.width))
                        .or(stroke),
                });
            }
            Geometry::LineString(line) => {
                let ring = self.ring_to_lon_lat(line, from)?;
                self.shapes.push(Shape::Path {
                    rings: vec![ring],
                    closed: false,
                    fill: None,
                    stroke,
                });
            }
            Geometry::Polygon(rings) => {
                let rings = rings
                    .iter()
                    .map(|r| self.ring_to_lon_lat(r, from))
                    .collect::<Result<Vec<_>, _>>()?;
                self.shapes.push(Shape::Path {
                    rings,
                    closed: true,
                    fill,
                    stroke,
                });
            }
            Geometry::Collection(parts) => {
                for part in parts {
                    self.push(part, style, from)?;
                }
            }
        }
        Ok(())
    }

    fn ring_to_lon_lat(
        &mut self,
        ring: &[Coordinate],
        from: Projection,
    ) -> Result<Vec<(f64, f64)>, CoordError> {
        ring.iter().map(|c| self.to_lon_lat(*c, from)).collect()
    }

    fn to_lon_lat(&mut self, c: Coordinate, from: Projection) -> Result<(f64, f64), CoordError> {
        let ll = coord::to_lon_lat(c, from)?;
        match &mut self.extent {
            Some(e) => e.extend(ll),
            None => self.extent = Some(Extent::from_point(ll)),
        }
        Ok((ll.x, ll.y))
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(
            color.r,
            color.g,
            color.b,
            (color.a * 255.0).round() as u8,
        )),
        anti_alias: true,
        ..Default::default()
    }
}

impl Tool for OverlayTool {
    fn extent(&self, _zoom: u8, _tile_size: f64) -> (f64, f64, f64, f64) {
        match self.extent {
            Some(e) => (e.min_x, e.min_y, e.max_x, e.max_y),
            None => (0.0, 0.0, 0.0, 0.0),
        }
    }

    fn draw(&self, bounds: &Bounds, mut pixmap: PixmapMut) {
        let px = |(lon, lat): (f64, f64)| {
            (
                bounds.x_to_px(lon_to_x(lon, bounds.zoom)) as f32,
                bounds.y_to_px(lat_to_y(lat, bounds.zoom)) as f32,
            )
        };

        for shape in &self.shapes {
            let (path, fill, stroke) = match shape {
                Shape::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => {
                    let (x, y) = px(*center);
                    (PathBuilder::from_circle(x, y, *radius), fill, stroke)
                }
                Shape::Path {
                    rings,
                    closed,
                    fill,
                    stroke,
                } => {
                    let mut pb = PathBuilder::new();
                    for ring in rings {
                        let mut points = ring.iter().map(|p| px(*p));
                        let Some((x, y)) = points.next() else {
                            continue;
                        };
                        pb.move_to(x, y);
                        for (x, y) in points {
                            pb.line_to(x, y);
                        }
                        if *closed {
                            pb.close();
                        }
                    }
                    (pb.finish(), fill, stroke)
                }
            };

            let Some(path) = path else {
                continue;
            };
            if let Some(color) = fill {
                pixmap.fill_path(
                    &path,
                    &paint(*color),
                    FillRule::EvenOdd,
                    Transform::default(),
                    None,
                );
            }
            if let Some((color, width)) = stroke {
                pixmap.stroke_path(
                    &path,
                    &paint(*color),
                    &Stroke {
                        width: *width,
                        ..Default::default()
                    },
                    Transform::default(),
                    None,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::{config_for, BasemapId};
    use crate::kml::Feature;
    use crate::map::{MapLayer, MemoryMapView};
    use crate::style::default_style;
    use std::sync::Arc;

    fn hk_map() -> MemoryMapView {
        let center = coord::from_lon_lat(Coordinate::lon_lat(114.1095, 22.3964), Projection::WebMercator)
            .unwrap();
        MemoryMapView::new(center, 10.3, Projection::WebMercator)
    }

    fn point(lon: f64, lat: f64) -> Feature {
        Feature {
            geometry: Some(Geometry::Point(
                coord::from_lon_lat(Coordinate::lon_lat(lon, lat), Projection::WebMercator).unwrap(),
            )),
            ..Feature::default()
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(export_file_name(1700000000123), "map-export-1700000000123.png");
    }

    #[test]
    fn test_prepare_snapshots_view_and_visible_overlays() {
        let mut map = hk_map();
        map.add_layer(MapLayer::vector(
            Arc::new(vec![point(114.0, 22.3), point(114.2, 22.5)]),
            default_style,
        ));
        let hidden = map.add_layer(MapLayer::vector(Arc::new(vec![point(0.0, 0.0)]), default_style));
        map.set_visible(hidden, false);

        let settings = PrintOptions {
            output_dir: PathBuf::from("/tmp/prints"),
            ..PrintOptions::default()
        };
        let layers = config_for(BasemapId::Greyscale).layers;
        let job = PrintJob::prepare(&map, &layers, &settings, 42).unwrap();

        assert_eq!(job.path, PathBuf::from("/tmp/prints/map-export-42.png"));
        assert_eq!((job.width, job.height), (800, 600));
        assert_eq!(job.zoom, 10);
        assert!((job.center.x - 114.1095).abs() < 1e-6);
        assert!((job.center.y - 22.3964).abs() < 1e-6);
        assert_eq!(job.url_templates.len(), 1);
        assert!(!job.url_templates[0].contains("{a-c}"));
        assert_eq!(job.overlays.len(), 2);

        let e = job.overlays.lon_lat_extent().unwrap();
        assert!((e.min_x - 114.0).abs() < 1e-6 && (e.max_y - 22.5).abs() < 1e-6);
    }

    #[test]
    fn test_prepare_keeps_every_basemap_layer_in_order() {
        let map = hk_map();
        let layers = config_for(BasemapId::Topographic).layers;
        let job = PrintJob::prepare(&map, &layers, &PrintOptions::default(), 0).unwrap();

        let expected: Vec<String> = layers.iter().map(|l| l.concrete_template()).collect();
        assert_eq!(job.url_templates.len(), 2);
        assert_eq!(job.url_templates, expected);
    }

    #[test]
    fn test_raster_layer_is_composited_over_base() {
        let mut label = Pixmap::new(4, 4).unwrap();
        label.fill(Color::from_rgba8(255, 0, 0, 255));
        let tool = RasterTool {
            pixmap: label,
            center: Coordinate::lon_lat(114.0, 22.0),
        };

        let mut target = Pixmap::new(4, 4).unwrap();
        target.fill(Color::from_rgba8(0, 0, 255, 255));
        let bounds = Bounds {
            height: 4,
            width: 4,
            x_center: 0.5,
            y_center: 0.5,
            x_min: 0,
            x_max: 1,
            y_min: 0,
            y_max: 1,
            tile_size: 256,
            zoom: 10,
        };
        tool.draw(&bounds, target.as_mut());

        let px = target.pixel(1, 1).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (255, 0, 0));
        assert_eq!(tool.extent(10, 256.0), (114.0, 22.0, 114.0, 22.0));
    }

    #[test]
    fn test_prepare_requires_basemap() {
        let map = hk_map();
        let err = PrintJob::prepare(&map, &[], &PrintOptions::default(), 0).unwrap_err();
        assert_eq!(err, PrintError::NoBasemap);
    }

    #[test]
    fn test_tool_extent_matches_shapes() {
        let mut tool = OverlayTool::default();
        let line = Geometry::LineString(vec![Coordinate::lon_lat(114.0, 22.2), Coordinate::lon_lat(114.3, 22.4)]);
        tool.push(&line, Style::default(), Projection::Wgs84).unwrap();
        assert_eq!(tool.extent(10, 256.0), (114.0, 22.2, 114.3, 22.4));
    }
}
