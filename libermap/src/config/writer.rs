//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[map]
; Home view, used at startup and by the Home control (WGS84 degrees)
home_lon = {}
home_lat = {}
default_zoom = {}
; Basemap shown at startup:
;   topographic - Lands Department topographic map
;   imagery     - Lands Department aerial imagery
;   greyscale   - CARTO light basemap
basemap = {}

[layers]
; Maximum overlays displayed at once; adding another removes the oldest.
; 0 = unlimited
max_active = {}

[search]
; Search box shown at startup: places or location
provider = {}
; Hong Kong Location Search API endpoint
location_search_url = {}
; Results listed per lookup
max_results = {}
; Queries shorter than this hide the result list
min_query_chars = {}
; Zoom level when jumping to a result
result_zoom = {}
; Seconds before the result pin is removed
marker_timeout_secs = {}

[content]
; GitHub contents API for the LiberData repository (must end with '/')
contents_url = {}
; Where the download command saves files
download_dir = {}

[download]
; HTTP request timeout in seconds
timeout = {}

[print]
; Directory for map-export-<timestamp>.png files
output_dir = {}
; Image size in pixels
width = {}
height = {}

[logging]
; Log file location
file = {}
; Enable debug-level logging (true/false)
debug = {}
"#,
        config.map.home_lon,
        config.map.home_lat,
        config.map.default_zoom,
        config.map.basemap,
        config.layers.max_active,
        config.search.provider,
        config.search.location_search_url,
        config.search.max_results,
        config.search.min_query_chars,
        config.search.result_zoom,
        config.search.marker_timeout_secs,
        config.content.contents_url,
        path_to_string(&config.content.download_dir),
        config.download.timeout,
        path_to_string(&config.print.output_dir),
        config.print.width,
        config.print.height,
        path_to_string(&config.logging.file),
        config.logging.debug,
    )
}

/// Convert a path to string, using ~ for home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::*;
    use crate::basemap::BasemapId;
    use crate::search::SearchProvider;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.map.basemap = BasemapId::Topographic;
        config.layers.max_active = 3;
        config.search.provider = SearchProvider::LocationSearch;
        config.print.output_dir = temp_dir.path().join("prints");
        config.download.timeout = 60;

        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.map.basemap, BasemapId::Topographic);
        assert_eq!(loaded.layers.max_active, 3);
        assert_eq!(loaded.search.provider, SearchProvider::LocationSearch);
        assert_eq!(loaded.print.output_dir, temp_dir.path().join("prints"));
        assert_eq!(loaded.download.timeout, 60);
        assert_eq!(loaded.map.default_zoom, 10.3);
    }

    #[test]
    fn test_written_file_is_commented() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.starts_with("[map]"));
        assert!(text.contains("; 0 = unlimited"));
        assert!(text.contains("basemap = greyscale"));
        assert!(text.contains("provider = places"));
    }

    #[test]
    fn test_home_paths_written_with_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("maps")), "~/maps");
        }
        assert_eq!(path_to_string(Path::new("/tmp/maps")), "/tmp/maps");
    }
}
