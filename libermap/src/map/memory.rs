//! Headless in-memory map view.
//!
//! Holds layers and camera state without rendering anything. Used by the
//! CLI and the tests, and as the state source for PNG export.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tracing::trace;

use super::types::{LayerHandle, MapLayer, MarkerSlot, ViewAnimation, ViewState, RESOLUTION_Z0};
use super::view::MapView;
use crate::coord::{Coordinate, Extent, Projection};

const MAX_FIT_ZOOM: f64 = 19.0;
/// Fraction of the viewport kept free around a fitted extent.
const FIT_PADDING: f64 = 0.05;

pub struct MemoryMapView {
    layers: BTreeMap<LayerHandle, MapLayer>,
    next_id: u64,
    view: ViewState,
    markers: HashMap<MarkerSlot, Coordinate>,
    viewport: (u32, u32),
    last_animation: Option<ViewAnimation>,
}

impl MemoryMapView {
    pub fn new(center: Coordinate, zoom: f64, projection: Projection) -> Self {
        Self {
            layers: BTreeMap::new(),
            next_id: 1,
            view: ViewState {
                center,
                zoom,
                rotation: 0.0,
                projection,
            },
            markers: HashMap::new(),
            viewport: (800, 600),
            last_animation: None,
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width.max(1), height.max(1));
        self
    }

    /// Most recent camera move requested through [`MapView::animate`] or [`MapView::fit`].
    pub fn last_animation(&self) -> Option<ViewAnimation> {
        self.last_animation
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.view.rotation = rotation;
    }
}

impl MapView for MemoryMapView {
    fn add_layer(&mut self, layer: MapLayer) -> LayerHandle {
        let handle = LayerHandle(self.next_id);
        self.next_id += 1;
        trace!(%handle, z_index = layer.z_index, "layer attached");
        self.layers.insert(handle, layer);
        handle
    }

    fn remove_layer(&mut self, handle: LayerHandle) -> Option<MapLayer> {
        self.layers.remove(&handle)
    }

    fn layer(&self, handle: LayerHandle) -> Option<&MapLayer> {
        self.layers.get(&handle)
    }

    fn set_visible(&mut self, handle: LayerHandle, visible: bool) -> bool {
        match self.layers.get_mut(&handle) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    fn layer_handles(&self) -> Vec<LayerHandle> {
        let mut handles: Vec<(i32, LayerHandle)> =
            self.layers.iter().map(|(h, l)| (l.z_index, *h)).collect();
        handles.sort();
        handles.into_iter().map(|(_, h)| h).collect()
    }

    fn view(&self) -> ViewState {
        self.view
    }

    fn animate(&mut self, animation: ViewAnimation) {
        self.view.center = animation.center;
        self.view.zoom = animation.zoom;
        self.last_animation = Some(animation);
    }

    fn fit(&mut self, extent: Extent, duration: Duration) {
        let (w, h) = (self.viewport.0 as f64, self.viewport.1 as f64);
        let usable = 1.0 - 2.0 * FIT_PADDING;
        let resolution = (extent.width() / (w * usable)).max(extent.height() / (h * usable));

        let zoom = if resolution > 0.0 {
            (RESOLUTION_Z0 / resolution).log2().clamp(0.0, MAX_FIT_ZOOM)
        } else {
            MAX_FIT_ZOOM
        };

        self.animate(ViewAnimation {
            center: extent.center(),
            zoom,
            duration,
        });
    }

    fn set_marker(&mut self, slot: MarkerSlot, position: Option<Coordinate>) {
        match position {
            Some(c) => {
                self.markers.insert(slot, c);
            }
            None => {
                self.markers.remove(&slot);
            }
        }
    }

    fn marker(&self, slot: MarkerSlot) -> Option<Coordinate> {
        self.markers.get(&slot).copied()
    }
}
