//! Map collaborator: layers, camera and markers.

mod memory;
mod types;
mod view;

pub use memory::MemoryMapView;
pub use types::{
    LayerHandle, LayerSource, MapLayer, MarkerSlot, ViewAnimation, ViewState, RESOLUTION_Z0,
};
pub use view::MapView;
