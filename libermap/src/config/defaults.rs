//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::basemap::BasemapId;
use crate::fetch::{DEFAULT_CONTENTS_URL, DEFAULT_LOCATION_SEARCH_URL};
use crate::search::{SearchProvider, DEFAULT_MAX_RESULTS, DEFAULT_MIN_QUERY_CHARS, DEFAULT_RESULT_ZOOM};

// =============================================================================
// Map defaults
// =============================================================================

/// Longitude of the Hong Kong home view.
pub const DEFAULT_HOME_LON: f64 = 114.1095;

/// Latitude of the Hong Kong home view.
pub const DEFAULT_HOME_LAT: f64 = 22.3964;

/// Zoom of the home view; shows the whole territory.
pub const DEFAULT_ZOOM: f64 = 10.3;

pub const DEFAULT_BASEMAP: BasemapId = BasemapId::Greyscale;

// =============================================================================
// Layer defaults
// =============================================================================

/// Default number of overlays kept on the map before the oldest is evicted.
pub const DEFAULT_MAX_ACTIVE_LAYERS: usize = 5;

// =============================================================================
// Search defaults
// =============================================================================

/// Default lifetime of a search pin in seconds.
pub const DEFAULT_MARKER_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Download defaults
// =============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Print defaults
// =============================================================================

pub const DEFAULT_PRINT_WIDTH: u32 = crate::print::DEFAULT_PRINT_WIDTH;
pub const DEFAULT_PRINT_HEIGHT: u32 = crate::print::DEFAULT_PRINT_HEIGHT;

/// Default download directory (~/Downloads, or ~/.libermap/downloads).
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| config_directory().join("downloads"))
}

/// Default print directory (~/Pictures, or ~/.libermap/prints).
pub fn default_print_dir() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| config_directory().join("prints"))
}

/// Default log file (~/.libermap/libermap.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(crate::logging::default_log_file())
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            map: MapSettings {
                home_lon: DEFAULT_HOME_LON,
                home_lat: DEFAULT_HOME_LAT,
                default_zoom: DEFAULT_ZOOM,
                basemap: DEFAULT_BASEMAP,
            },
            layers: LayerSettings {
                max_active: DEFAULT_MAX_ACTIVE_LAYERS,
            },
            search: SearchSettings {
                provider: SearchProvider::default(),
                location_search_url: DEFAULT_LOCATION_SEARCH_URL.to_string(),
                max_results: DEFAULT_MAX_RESULTS,
                min_query_chars: DEFAULT_MIN_QUERY_CHARS,
                result_zoom: DEFAULT_RESULT_ZOOM,
                marker_timeout_secs: DEFAULT_MARKER_TIMEOUT_SECS,
            },
            content: ContentSettings {
                contents_url: DEFAULT_CONTENTS_URL.to_string(),
                download_dir: default_download_dir(),
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            },
            print: PrintSettings {
                output_dir: default_print_dir(),
                width: DEFAULT_PRINT_WIDTH,
                height: DEFAULT_PRINT_HEIGHT,
            },
            logging: LoggingSettings {
                file: default_log_file(),
                debug: false,
            },
        }
    }
}
