//! LiberMap - Hong Kong open-data map viewer
//!
//! This library holds the state and behaviour of the LiberMap viewer: a
//! basemap of Lands Department tiles, KML overlays browsed from the LiberData
//! repository or loaded from disk, a legend kept in step with the overlays,
//! location search against the government geocoder, and PNG export.
//!
//! # High-Level API
//!
//! The [`viewer`] module ties everything together:
//!
//! ```ignore
//! use libermap::config::ConfigFile;
//! use libermap::fetch::AsyncReqwestClient;
//! use libermap::map::MemoryMapView;
//! use libermap::viewer::{Command, Viewer, ViewerOptions};
//!
//! let options = ViewerOptions::from_config(&ConfigFile::load()?);
//! let center = options.home_in(Projection::WebMercator)?;
//! let map = MemoryMapView::new(center, options.home_zoom, Projection::WebMercator);
//! let mut viewer = Viewer::new(map, AsyncReqwestClient::new()?, options);
//!
//! viewer.dispatch(Command::ToggleUrl { url });
//! viewer.settle().await;
//! ```

pub mod basemap;
pub mod config;
pub mod controls;
pub mod coord;
pub mod events;
pub mod fetch;
pub mod filetree;
pub mod geolocation;
pub mod kml;
pub mod legend;
pub mod logging;
pub mod map;
pub mod popup;
pub mod print;
pub mod registry;
pub mod search;
pub mod style;
pub mod viewer;

/// Version of the LiberMap library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
