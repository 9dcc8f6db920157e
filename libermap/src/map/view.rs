//! The map collaborator seam.

use std::time::Duration;

use super::types::{LayerHandle, MapLayer, MarkerSlot, ViewAnimation, ViewState};
use crate::coord::{Coordinate, Extent};

/// Everything the viewer needs from a map renderer.
///
/// Calls come from the viewer's event loop only, so implementations need no
/// interior locking.
pub trait MapView: Send {
    /// Attach a layer and return its handle.
    fn add_layer(&mut self, layer: MapLayer) -> LayerHandle;

    /// Detach a layer. Returns `None` when the handle is not attached.
    fn remove_layer(&mut self, handle: LayerHandle) -> Option<MapLayer>;

    fn layer(&self, handle: LayerHandle) -> Option<&MapLayer>;

    /// Change visibility. Returns false for unknown handles.
    fn set_visible(&mut self, handle: LayerHandle, visible: bool) -> bool;

    /// Attached layers, bottom-most first.
    fn layer_handles(&self) -> Vec<LayerHandle>;

    fn view(&self) -> ViewState;

    fn animate(&mut self, animation: ViewAnimation);

    /// Move the camera so `extent` fills the viewport.
    fn fit(&mut self, extent: Extent, duration: Duration);

    /// Place (`Some`) or clear (`None`) a marker.
    fn set_marker(&mut self, slot: MarkerSlot, position: Option<Coordinate>);

    fn marker(&self, slot: MarkerSlot) -> Option<Coordinate>;

    /// True when `handle` is attached.
    fn contains(&self, handle: LayerHandle) -> bool {
        self.layer(handle).is_some()
    }
}
