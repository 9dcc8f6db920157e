//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("home_lon") {
            config.map.home_lon = parse_in_range(v, MIN_LON, MAX_LON)
                .ok_or_else(|| invalid("map", "home_lon", v, "must be a longitude in degrees"))?;
        }
        if let Some(v) = section.get("home_lat") {
            config.map.home_lat = parse_in_range(v, MIN_LAT, MAX_LAT)
                .ok_or_else(|| invalid("map", "home_lat", v, "must be a latitude in degrees"))?;
        }
        if let Some(v) = section.get("default_zoom") {
            config.map.default_zoom = parse_in_range(v, 0.0, 28.0)
                .ok_or_else(|| invalid("map", "default_zoom", v, "must be between 0 and 28"))?;
        }
        if let Some(v) = section.get("basemap") {
            config.map.basemap = v.parse().map_err(|_| {
                invalid("map", "basemap", v, "must be one of: topographic, imagery, greyscale")
            })?;
        }
    }

    // [layers] section
    if let Some(section) = ini.section(Some("layers")) {
        if let Some(v) = section.get("max_active") {
            config.layers.max_active = parse_number(v).ok_or_else(|| {
                invalid("layers", "max_active", v, "must be a non-negative integer (0 = unlimited)")
            })?;
        }
    }

    // [search] section
    if let Some(section) = ini.section(Some("search")) {
        if let Some(v) = section.get("provider") {
            config.search.provider = v
                .parse()
                .map_err(|_| invalid("search", "provider", v, "must be one of: places, location"))?;
        }
        if let Some(v) = section.get("location_search_url") {
            let v = v.trim();
            if !v.is_empty() {
                url::Url::parse(v)
                    .map_err(|e| invalid("search", "location_search_url", v, &e.to_string()))?;
                config.search.location_search_url = v.to_string();
            }
        }
        if let Some(v) = section.get("max_results") {
            config.search.max_results = parse_positive(v)
                .ok_or_else(|| invalid("search", "max_results", v, "must be a positive integer"))?;
        }
        if let Some(v) = section.get("min_query_chars") {
            config.search.min_query_chars = parse_number(v).ok_or_else(|| {
                invalid("search", "min_query_chars", v, "must be a non-negative integer")
            })?;
        }
        if let Some(v) = section.get("result_zoom") {
            config.search.result_zoom = parse_in_range(v, 0.0, 28.0)
                .ok_or_else(|| invalid("search", "result_zoom", v, "must be between 0 and 28"))?;
        }
        if let Some(v) = section.get("marker_timeout_secs") {
            config.search.marker_timeout_secs = parse_positive(v).ok_or_else(|| {
                invalid("search", "marker_timeout_secs", v, "must be a positive integer")
            })?;
        }
    }

    // [content] section
    if let Some(section) = ini.section(Some("content")) {
        if let Some(v) = section.get("contents_url") {
            let v = v.trim();
            if !v.is_empty() {
                if !v.ends_with('/') {
                    return Err(invalid("content", "contents_url", v, "must end with '/'"));
                }
                url::Url::parse(v).map_err(|e| invalid("content", "contents_url", v, &e.to_string()))?;
                config.content.contents_url = v.to_string();
            }
        }
        if let Some(v) = section.get("download_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.content.download_dir = expand_tilde(v);
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive(v)
                .ok_or_else(|| invalid("download", "timeout", v, "must be a positive integer (seconds)"))?;
        }
    }

    // [print] section
    if let Some(section) = ini.section(Some("print")) {
        if let Some(v) = section.get("output_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.print.output_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("width") {
            config.print.width =
                parse_positive(v).ok_or_else(|| invalid("print", "width", v, "must be a positive integer"))?;
        }
        if let Some(v) = section.get("height") {
            config.print.height =
                parse_positive(v).ok_or_else(|| invalid("print", "height", v, "must be a positive integer"))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("debug") {
            config.logging.debug = parse_bool(v);
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

fn parse_positive<T: FromStr + Default + PartialOrd>(value: &str) -> Option<T> {
    parse_number(value).filter(|n: &T| *n > T::default())
}

fn parse_in_range(value: &str, min: f64, max: f64) -> Option<f64> {
    parse_number::<f64>(value).filter(|n| n.is_finite() && (min..=max).contains(n))
}

/// Parse a boolean value from a string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::BasemapId;
    use crate::config::defaults::*;
    use crate::search::SearchProvider;
    use tempfile::TempDir;

    fn load(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, text).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = load("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_map_section() {
        let config = load(
            r#"
[map]
home_lon = 114.17
home_lat = 22.30
default_zoom = 12
basemap = Imagery
"#,
        )
        .unwrap();

        assert_eq!(config.map.home_lon, 114.17);
        assert_eq!(config.map.home_lat, 22.30);
        assert_eq!(config.map.default_zoom, 12.0);
        assert_eq!(config.map.basemap, BasemapId::Imagery);
    }

    #[test]
    fn test_invalid_basemap() {
        let err = load("[map]\nbasemap = satellite\n").unwrap_err();
        assert!(err.to_string().contains("must be one of:"));
        assert!(err.to_string().contains("greyscale"));
    }

    #[test]
    fn test_latitude_out_of_range() {
        let err = load("[map]\nhome_lat = 91\n").unwrap_err();
        assert!(err.to_string().contains("map.home_lat"));
    }

    #[test]
    fn test_zero_max_active_means_unlimited() {
        let config = load("[layers]\nmax_active = 0\n").unwrap();
        assert_eq!(config.layers.max_active, 0);
        assert_eq!(config.layer_capacity(), None);
    }

    #[test]
    fn test_negative_max_active_rejected() {
        let err = load("[layers]\nmax_active = -1\n").unwrap_err();
        assert!(err.to_string().contains("max_active"));
    }

    #[test]
    fn test_search_section() {
        let config = load(
            r#"
[search]
provider = location
max_results = 8
min_query_chars = 3
marker_timeout_secs = 10
"#,
        )
        .unwrap();

        assert_eq!(config.search.provider, SearchProvider::LocationSearch);
        assert_eq!(config.search.max_results, 8);
        assert_eq!(config.search.min_query_chars, 3);
        assert_eq!(config.search.marker_timeout_secs, 10);
        assert_eq!(config.search.result_zoom, crate::search::DEFAULT_RESULT_ZOOM);
    }

    #[test]
    fn test_zero_marker_timeout_rejected() {
        let err = load("[search]\nmarker_timeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_invalid_search_url() {
        let err = load("[search]\nlocation_search_url = not a url\n").unwrap_err();
        assert!(err.to_string().contains("location_search_url"));
    }

    #[test]
    fn test_contents_url_requires_trailing_slash() {
        let err = load("[content]\ncontents_url = https://example.com/contents\n").unwrap_err();
        assert!(err.to_string().contains("must end with '/'"));

        let config = load("[content]\ncontents_url = https://example.com/contents/\n").unwrap();
        assert_eq!(config.content.contents_url, "https://example.com/contents/");
    }

    #[test]
    fn test_tilde_paths_expanded() {
        let config = load("[print]\noutput_dir = ~/maps\n").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.print.output_dir, home.join("maps"));
        }
    }

    #[test]
    fn test_empty_path_keeps_default() {
        let config = load("[content]\ndownload_dir =\n").unwrap();
        assert_eq!(config.content.download_dir, default_download_dir());
    }

    #[test]
    fn test_logging_debug_flag() {
        let config = load("[logging]\ndebug = yes\n").unwrap();
        assert!(config.logging.debug);
        assert!(!parse_bool("off"));
    }

    #[test]
    fn test_download_timeout() {
        let config = load("[download]\ntimeout = 5\n").unwrap();
        assert_eq!(config.download.timeout, 5);
        assert_ne!(config.download.timeout, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
    }
}
