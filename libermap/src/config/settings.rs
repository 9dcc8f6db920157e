//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::basemap::BasemapId;
use crate::search::SearchProvider;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Initial view and basemap
    pub map: MapSettings,
    /// Overlay layer limits
    pub layers: LayerSettings,
    /// Search box behaviour
    pub search: SearchSettings,
    /// LiberData repository access
    pub content: ContentSettings,
    /// HTTP settings
    pub download: DownloadSettings,
    /// PNG export settings
    pub print: PrintSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Initial view configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Home longitude (WGS84 degrees)
    pub home_lon: f64,
    /// Home latitude (WGS84 degrees)
    pub home_lat: f64,
    /// Zoom level of the home view
    pub default_zoom: f64,
    /// Basemap shown at startup
    pub basemap: BasemapId,
}

/// Overlay layer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    /// Maximum overlays displayed at once. 0 keeps every layer.
    pub max_active: usize,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Provider active at startup
    pub provider: SearchProvider,
    /// Location search endpoint
    pub location_search_url: String,
    /// Results shown per lookup
    pub max_results: usize,
    /// Shortest query sent to the location search
    pub min_query_chars: usize,
    /// Zoom used when jumping to a result
    pub result_zoom: f64,
    /// Seconds before a result pin disappears
    pub marker_timeout_secs: u64,
}

/// LiberData repository configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSettings {
    /// GitHub contents API base, ending in `/contents/`
    pub contents_url: String,
    /// Where downloaded files are saved
    pub download_dir: PathBuf,
}

/// Download configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Timeout in seconds for HTTP requests.
    pub timeout: u64,
}

/// Map export configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSettings {
    /// Directory receiving `map-export-*.png`
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
    /// Log at debug level instead of info
    pub debug: bool,
}
