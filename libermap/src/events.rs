//! Viewer notifications.
//!
//! Components never call each other back directly. State changes are
//! announced as [`MapEvent`]s on an [`EventBus`] and any number of
//! observers (CLI output, tests, a future UI) subscribe to them.

use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::trace;

use crate::basemap::{BasemapId, TileLayerConfig};
use crate::coord::Coordinate;
use crate::legend::LegendItem;

/// Default broadcast buffer. Slow subscribers lag rather than block.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Why a layer left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// User toggled it off
    Toggled,
    /// Pushed out by the capacity bound
    Evicted,
}

/// Events published by the viewer.
#[derive(Clone, Debug)]
pub enum MapEvent {
    // =========================================================================
    // Basemap
    // =========================================================================
    /// The active basemap changed.
    BasemapChanged {
        id: BasemapId,
        layers: Vec<TileLayerConfig>,
    },

    // =========================================================================
    // Overlays and legend
    // =========================================================================
    LayerAdded {
        key: String,
        features: usize,
    },

    LayerRemoved {
        key: String,
        reason: RemovalReason,
    },

    /// Loading a layer failed; nothing was added.
    LayerFailed {
        key: String,
        error: String,
    },

    LegendRebuilt {
        items: Vec<LegendItem>,
    },

    // =========================================================================
    // Search
    // =========================================================================
    SearchResultsChanged {
        names: Vec<String>,
        visible: bool,
    },

    MarkerPlaced {
        position: Coordinate,
    },

    MarkerCleared,

    // =========================================================================
    // File tree and files
    // =========================================================================
    FolderLoaded {
        path: String,
        children: usize,
    },

    FolderFailed {
        path: String,
        error: String,
    },

    DownloadSaved {
        path: PathBuf,
        bytes: usize,
    },

    /// The user asked to open a local file (add-layer control).
    FileRequested,

    // =========================================================================
    // View and controls
    // =========================================================================
    PopupShown {
        position: Coordinate,
        title: Option<String>,
    },

    PopupHidden,

    PrintExported {
        path: PathBuf,
    },

    /// User-visible message for an unsupported or failed operation.
    Alert {
        message: String,
    },
}

impl MapEvent {
    /// Short event name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::BasemapChanged { .. } => "basemap_changed",
            MapEvent::LayerAdded { .. } => "layer_added",
            MapEvent::LayerRemoved { .. } => "layer_removed",
            MapEvent::LayerFailed { .. } => "layer_failed",
            MapEvent::LegendRebuilt { .. } => "legend_rebuilt",
            MapEvent::SearchResultsChanged { .. } => "search_results_changed",
            MapEvent::MarkerPlaced { .. } => "marker_placed",
            MapEvent::MarkerCleared => "marker_cleared",
            MapEvent::FolderLoaded { .. } => "folder_loaded",
            MapEvent::FolderFailed { .. } => "folder_failed",
            MapEvent::DownloadSaved { .. } => "download_saved",
            MapEvent::FileRequested => "file_requested",
            MapEvent::PopupShown { .. } => "popup_shown",
            MapEvent::PopupHidden => "popup_hidden",
            MapEvent::PrintExported { .. } => "print_exported",
            MapEvent::Alert { .. } => "alert",
        }
    }
}

/// Broadcast bus for [`MapEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MapEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: MapEvent) {
        trace!(event = event.event_type(), "publish");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(MapEvent::MarkerCleared);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(MapEvent::PopupHidden);
        bus.publish(MapEvent::Alert {
            message: "x".into(),
        });

        assert_eq!(rx.try_recv().unwrap().event_type(), "popup_hidden");
        assert_eq!(rx.try_recv().unwrap().event_type(), "alert");
        assert!(rx.try_recv().is_err());
    }
}
