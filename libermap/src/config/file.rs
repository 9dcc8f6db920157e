//! Configuration file handling for ~/.libermap/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::coord::Coordinate;
use crate::print::PrintOptions;
use crate::search::SearchOptions;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.libermap/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.libermap/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// Home view centre as lon/lat.
    pub fn home(&self) -> Coordinate {
        Coordinate::lon_lat(self.map.home_lon, self.map.home_lat)
    }

    /// Layer registry capacity; `None` when unlimited.
    pub fn layer_capacity(&self) -> Option<usize> {
        Some(self.layers.max_active).filter(|n| *n > 0)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            min_query_chars: self.search.min_query_chars,
            max_results: self.search.max_results,
            result_zoom: self.search.result_zoom,
            marker_timeout: Duration::from_secs(self.search.marker_timeout_secs),
        }
    }

    pub fn print_options(&self) -> PrintOptions {
        PrintOptions {
            width: self.print.width,
            height: self.print.height,
            output_dir: self.print.output_dir.clone(),
        }
    }
}

/// Get the path to the config directory (~/.libermap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".libermap")
}

/// Get the path to the config file (~/.libermap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::BasemapId;
    use crate::config::defaults::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.map.basemap, BasemapId::Greyscale);
        assert_eq!(config.home(), Coordinate::lon_lat(114.1095, 22.3964));
        assert_eq!(config.map.default_zoom, DEFAULT_ZOOM);
        assert_eq!(config.layer_capacity(), Some(DEFAULT_MAX_ACTIVE_LAYERS));
        assert_eq!(config.download.timeout, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        assert!(config.content.contents_url.ends_with("/contents/"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_search_options_from_config() {
        let mut config = ConfigFile::default();
        config.search.marker_timeout_secs = 9;
        config.search.max_results = 3;

        let options = config.search_options();
        assert_eq!(options.marker_timeout, Duration::from_secs(9));
        assert_eq!(options.max_results, 3);
        assert_eq!(options.min_query_chars, 2);
    }

    #[test]
    fn test_print_options_from_config() {
        let config = ConfigFile::default();
        let options = config.print_options();
        assert_eq!((options.width, options.height), (800, 600));
        assert_eq!(options.output_dir, config.print.output_dir);
    }

    #[test]
    fn test_config_file_under_dot_directory() {
        let path = config_file_path();
        assert!(path.ends_with(".libermap/config.ini"));
    }
}
