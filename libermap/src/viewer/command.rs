//! Inputs of the viewer loop.
//!
//! [`Command`]s come from the user (CLI, shell, tests). [`Message`]s are
//! posted back by tasks the viewer spawned: fetches, timers, exports.

use std::path::PathBuf;

use thiserror::Error;

use crate::controls::ControlAction;
use crate::coord::Coordinate;
use crate::fetch::{DirectoryEntry, FetchError, LocationResult};
use crate::kml::{Feature, KmlError};
use crate::print::PrintError;
use crate::search::{PlaceCandidate, SearchProvider};

/// Alert shown when a local file cannot be loaded.
pub const FILE_READ_ALERT: &str = "Error reading file.";

/// User intents.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // =========================================================================
    // File tree
    // =========================================================================
    /// Expand or collapse the directory at `path`.
    ToggleFolder { path: String },

    /// Add or remove the file leaf at `path`.
    ToggleFile { path: String },

    /// Save the file leaf at `path` into the download directory.
    DownloadFile { path: String },

    /// Open or close the LiberData panel.
    ToggleFilePanel,

    // =========================================================================
    // Overlays
    // =========================================================================
    /// Add or remove a layer by source URL. URLs containing `wms` become
    /// WMS raster layers; anything else is fetched as KML.
    ToggleUrl { url: String },

    /// Load a KML file from disk, keyed by its file name.
    AddLocalFile { path: PathBuf },

    /// Legend checkbox.
    SetLayerVisibility { key: String, visible: bool },

    ToggleLegendPanel,

    // =========================================================================
    // Basemap and search
    // =========================================================================
    /// Switch basemap by name. Unknown names are ignored.
    SwitchBasemap { name: String },

    SetSearchProvider(SearchProvider),

    /// Location search input changed.
    SearchInput { text: String },

    /// Pick entry `index` of the location results.
    SelectResult { index: usize },

    /// Places widget reported a selection.
    PlacesChanged { places: Vec<PlaceCandidate> },

    // =========================================================================
    // View and controls
    // =========================================================================
    /// Click at `position` in view coordinates.
    MapClick { position: Coordinate },

    ClosePopup,

    /// A map control button was activated.
    Control(ControlAction),
}

/// Failure to turn a source into a layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to parse KML: {0}")]
    Kml(#[from] KmlError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Completions posted back to the viewer loop.
#[derive(Debug)]
pub enum Message {
    FolderListed {
        path: String,
        result: Result<Vec<DirectoryEntry>, FetchError>,
    },

    /// Remote layer content fetched and parsed.
    LayerFetched {
        key: String,
        result: Result<Vec<Feature>, LoadError>,
    },

    /// Local file read and parsed; `key` is the file name.
    LocalFileLoaded {
        key: String,
        result: Result<Vec<Feature>, LoadError>,
    },

    LocationResults {
        generation: u64,
        result: Result<Vec<LocationResult>, FetchError>,
    },

    /// Pin removal timer for placement `seq` elapsed.
    MarkerExpired { seq: u64 },

    DownloadFinished {
        url: String,
        result: Result<(PathBuf, usize), FetchError>,
    },

    PrintFinished { result: Result<PathBuf, PrintError> },
}

impl Message {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::FolderListed { .. } => "folder_listed",
            Message::LayerFetched { .. } => "layer_fetched",
            Message::LocalFileLoaded { .. } => "local_file_loaded",
            Message::LocationResults { .. } => "location_results",
            Message::MarkerExpired { .. } => "marker_expired",
            Message::DownloadFinished { .. } => "download_finished",
            Message::PrintFinished { .. } => "print_finished",
        }
    }

    /// Timer messages are not tracked as in-flight work.
    pub(super) fn is_tracked(&self) -> bool {
        !matches!(self, Message::MarkerExpired { .. })
    }
}
