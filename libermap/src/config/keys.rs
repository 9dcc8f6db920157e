//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::parser::{expand_tilde, parse_bool};
use super::settings::ConfigFile;
use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Map settings
    MapHomeLon,
    MapHomeLat,
    MapDefaultZoom,
    MapBasemap,

    // Layer settings
    LayersMaxActive,

    // Search settings
    SearchProvider,
    SearchLocationSearchUrl,
    SearchMaxResults,
    SearchMinQueryChars,
    SearchResultZoom,
    SearchMarkerTimeoutSecs,

    // Content settings
    ContentContentsUrl,
    ContentDownloadDir,

    // Download settings
    DownloadTimeout,

    // Print settings
    PrintOutputDir,
    PrintWidth,
    PrintHeight,

    // Logging settings
    LoggingFile,
    LoggingDebug,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "search.provider").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::MapHomeLon => "map.home_lon",
            ConfigKey::MapHomeLat => "map.home_lat",
            ConfigKey::MapDefaultZoom => "map.default_zoom",
            ConfigKey::MapBasemap => "map.basemap",
            ConfigKey::LayersMaxActive => "layers.max_active",
            ConfigKey::SearchProvider => "search.provider",
            ConfigKey::SearchLocationSearchUrl => "search.location_search_url",
            ConfigKey::SearchMaxResults => "search.max_results",
            ConfigKey::SearchMinQueryChars => "search.min_query_chars",
            ConfigKey::SearchResultZoom => "search.result_zoom",
            ConfigKey::SearchMarkerTimeoutSecs => "search.marker_timeout_secs",
            ConfigKey::ContentContentsUrl => "content.contents_url",
            ConfigKey::ContentDownloadDir => "content.download_dir",
            ConfigKey::DownloadTimeout => "download.timeout",
            ConfigKey::PrintOutputDir => "print.output_dir",
            ConfigKey::PrintWidth => "print.width",
            ConfigKey::PrintHeight => "print.height",
            ConfigKey::LoggingFile => "logging.file",
            ConfigKey::LoggingDebug => "logging.debug",
        }
    }

    /// Get the section name (e.g., "search").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "provider").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::MapHomeLon => config.map.home_lon.to_string(),
            ConfigKey::MapHomeLat => config.map.home_lat.to_string(),
            ConfigKey::MapDefaultZoom => config.map.default_zoom.to_string(),
            ConfigKey::MapBasemap => config.map.basemap.to_string(),
            ConfigKey::LayersMaxActive => config.layers.max_active.to_string(),
            ConfigKey::SearchProvider => config.search.provider.to_string(),
            ConfigKey::SearchLocationSearchUrl => config.search.location_search_url.clone(),
            ConfigKey::SearchMaxResults => config.search.max_results.to_string(),
            ConfigKey::SearchMinQueryChars => config.search.min_query_chars.to_string(),
            ConfigKey::SearchResultZoom => config.search.result_zoom.to_string(),
            ConfigKey::SearchMarkerTimeoutSecs => config.search.marker_timeout_secs.to_string(),
            ConfigKey::ContentContentsUrl => config.content.contents_url.clone(),
            ConfigKey::ContentDownloadDir => path_to_display(&config.content.download_dir),
            ConfigKey::DownloadTimeout => config.download.timeout.to_string(),
            ConfigKey::PrintOutputDir => path_to_display(&config.print.output_dir),
            ConfigKey::PrintWidth => config.print.width.to_string(),
            ConfigKey::PrintHeight => config.print.height.to_string(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
            ConfigKey::LoggingDebug => config.logging.debug.to_string(),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        match self {
            ConfigKey::MapHomeLon => config.map.home_lon = self.parse(value)?,
            ConfigKey::MapHomeLat => config.map.home_lat = self.parse(value)?,
            ConfigKey::MapDefaultZoom => config.map.default_zoom = self.parse(value)?,
            ConfigKey::MapBasemap => config.map.basemap = self.parse(value)?,
            ConfigKey::LayersMaxActive => config.layers.max_active = self.parse(value)?,
            ConfigKey::SearchProvider => config.search.provider = self.parse(value)?,
            ConfigKey::SearchLocationSearchUrl => {
                config.search.location_search_url = value.to_string();
            }
            ConfigKey::SearchMaxResults => config.search.max_results = self.parse(value)?,
            ConfigKey::SearchMinQueryChars => config.search.min_query_chars = self.parse(value)?,
            ConfigKey::SearchResultZoom => config.search.result_zoom = self.parse(value)?,
            ConfigKey::SearchMarkerTimeoutSecs => {
                config.search.marker_timeout_secs = self.parse(value)?;
            }
            ConfigKey::ContentContentsUrl => config.content.contents_url = value.to_string(),
            ConfigKey::ContentDownloadDir => config.content.download_dir = expand_tilde(value),
            ConfigKey::DownloadTimeout => config.download.timeout = self.parse(value)?,
            ConfigKey::PrintOutputDir => config.print.output_dir = expand_tilde(value),
            ConfigKey::PrintWidth => config.print.width = self.parse(value)?,
            ConfigKey::PrintHeight => config.print.height = self.parse(value)?,
            ConfigKey::LoggingFile => config.logging.file = expand_tilde(value),
            ConfigKey::LoggingDebug => config.logging.debug = parse_bool(value),
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("cannot parse '{}'", value),
        })
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::MapHomeLon => Box::new(RangeSpec::new(MIN_LON, MAX_LON)),
            ConfigKey::MapHomeLat => Box::new(RangeSpec::new(MIN_LAT, MAX_LAT)),
            ConfigKey::MapDefaultZoom => Box::new(RangeSpec::new(0.0, 28.0)),
            ConfigKey::MapBasemap => {
                Box::new(OneOfSpec::new(&["topographic", "imagery", "greyscale"]))
            }
            ConfigKey::LayersMaxActive => Box::new(NonNegativeIntegerSpec),
            ConfigKey::SearchProvider => Box::new(OneOfSpec::new(&["places", "location"])),
            ConfigKey::SearchLocationSearchUrl => Box::new(UrlSpec { trailing_slash: false }),
            ConfigKey::SearchMaxResults => Box::new(PositiveIntegerSpec),
            ConfigKey::SearchMinQueryChars => Box::new(NonNegativeIntegerSpec),
            ConfigKey::SearchResultZoom => Box::new(RangeSpec::new(0.0, 28.0)),
            ConfigKey::SearchMarkerTimeoutSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::ContentContentsUrl => Box::new(UrlSpec { trailing_slash: true }),
            ConfigKey::ContentDownloadDir => Box::new(PathSpec),
            ConfigKey::DownloadTimeout => Box::new(PositiveIntegerSpec),
            ConfigKey::PrintOutputDir => Box::new(PathSpec),
            ConfigKey::PrintWidth => Box::new(PositiveIntegerSpec),
            ConfigKey::PrintHeight => Box::new(PositiveIntegerSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
            ConfigKey::LoggingDebug => Box::new(BooleanSpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::MapHomeLon,
            ConfigKey::MapHomeLat,
            ConfigKey::MapDefaultZoom,
            ConfigKey::MapBasemap,
            ConfigKey::LayersMaxActive,
            ConfigKey::SearchProvider,
            ConfigKey::SearchLocationSearchUrl,
            ConfigKey::SearchMaxResults,
            ConfigKey::SearchMinQueryChars,
            ConfigKey::SearchResultZoom,
            ConfigKey::SearchMarkerTimeoutSecs,
            ConfigKey::ContentContentsUrl,
            ConfigKey::ContentDownloadDir,
            ConfigKey::DownloadTimeout,
            ConfigKey::PrintOutputDir,
            ConfigKey::PrintWidth,
            ConfigKey::PrintHeight,
            ConfigKey::LoggingFile,
            ConfigKey::LoggingDebug,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Specification for integers greater than zero.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

/// Specification for integers including zero.
struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u32>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Specification for numbers within an inclusive range.
struct RangeSpec {
    min: f64,
    max: f64,
}

impl RangeSpec {
    fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl ValueSpecification for RangeSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= self.min && n <= self.max => Ok(()),
            _ => Err(format!("must be a number between {} and {}", self.min, self.max)),
        }
    }
}

/// Specification for boolean values.
struct BooleanSpec;

impl ValueSpecification for BooleanSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        let valid = ["true", "false", "yes", "no", "1", "0", "on", "off"];
        if valid.contains(&lower.as_str()) {
            Ok(())
        } else {
            Err("must be true/false, yes/no, 1/0, or on/off".to_string())
        }
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

/// Specification for http(s) URLs.
struct UrlSpec {
    trailing_slash: bool,
}

impl ValueSpecification for UrlSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let url = url::Url::parse(value).map_err(|e| format!("must be a URL ({})", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("must be a URL starting with 'http://' or 'https://'".to_string());
        }
        if self.trailing_slash && !value.ends_with('/') {
            return Err("must end with '/'".to_string());
        }
        Ok(())
    }
}

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
