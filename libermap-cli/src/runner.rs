//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, viewer creation, and event output
//! to reduce duplication across command handlers.

use crate::error::CliError;
use libermap::config::ConfigFile;
use libermap::coord::{self, Projection};
use libermap::events::MapEvent;
use libermap::fetch::AsyncReqwestClient;
use libermap::logging::{init_logging, LogOutput, LoggingGuard};
use libermap::map::MemoryMapView;
use libermap::viewer::{Viewer, ViewerOptions};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;

/// The viewer as the CLI drives it.
pub type CliViewer = Viewer<AsyncReqwestClient, MemoryMapView>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner with optional debug logging.
    ///
    /// Log records always go to the log file. They are mirrored to stderr
    /// in debug mode or when stderr is not a terminal, so stdout carries
    /// only command output.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of config
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let output = LogOutput {
            console: debug_mode || !atty::is(atty::Stream::Stderr),
            debug: debug_mode || config.logging.debug,
        };
        let logging_guard = init_logging(&config.logging.file, output)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Export to `dir` instead of the configured print directory.
    pub fn set_print_dir(&mut self, dir: PathBuf) {
        self.config.print.output_dir = dir;
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("LiberMap v{}", libermap::VERSION);
        info!("LiberMap CLI: {} command", command);
    }

    /// Create a viewer over a headless map sized like a print.
    pub fn create_viewer(&self) -> Result<CliViewer, CliError> {
        let options = ViewerOptions::from_config(&self.config);
        let center = coord::from_lon_lat(options.home, Projection::WebMercator)
            .map_err(|e| CliError::Config(format!("map.home: {}", e)))?;
        let map = MemoryMapView::new(center, options.home_zoom, Projection::WebMercator)
            .with_viewport(options.print.width, options.print.height);

        let http = AsyncReqwestClient::with_timeout(self.config.download.timeout)
            .map_err(CliError::HttpClient)?;

        info!("Viewer created");
        Ok(Viewer::new(map, http, options))
    }
}

/// Print every event queued on `events` and return the first failure, if any.
pub fn drain_events(events: &mut broadcast::Receiver<MapEvent>) -> Option<String> {
    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        if let Some(line) = describe_event(&event) {
            println!("{}", line);
        }
        let error = match event {
            MapEvent::LayerFailed { key, error } => Some(format!("{}: {}", key, error)),
            MapEvent::FolderFailed { path, error } => Some(format!("{}: {}", path, error)),
            MapEvent::Alert { message } => Some(message),
            _ => None,
        };
        if failure.is_none() {
            failure = error;
        }
    }
    failure
}

/// One-line description of an event for terminal output.
///
/// Events that only matter to a graphical front end return `None`.
pub fn describe_event(event: &MapEvent) -> Option<String> {
    match event {
        MapEvent::BasemapChanged { id, .. } => Some(format!("Basemap: {}", id)),
        MapEvent::LayerAdded { key, features } => {
            Some(format!("+ {} ({} features)", key, features))
        }
        MapEvent::LayerRemoved { key, reason } => Some(format!("- {} ({:?})", key, reason)),
        MapEvent::LayerFailed { key, error } => Some(format!("! {}: {}", key, error)),
        MapEvent::LegendRebuilt { items } => {
            let mut lines = vec![format!("Legend ({} layers)", items.len())];
            for item in items {
                let mark = if item.visible { "x" } else { " " };
                lines.push(format!("  [{}] {}", mark, item.label));
            }
            Some(lines.join("\n"))
        }
        MapEvent::SearchResultsChanged { names, visible } => {
            if !visible {
                return None;
            }
            let lines: Vec<String> = names
                .iter()
                .enumerate()
                .map(|(i, name)| format!("  {}. {}", i, name))
                .collect();
            Some(lines.join("\n"))
        }
        MapEvent::MarkerPlaced { position } => {
            let lon_lat = coord::to_lon_lat(*position, Projection::WebMercator).ok()?;
            Some(format!("Pin at {:.5}, {:.5}", lon_lat.x, lon_lat.y))
        }
        MapEvent::MarkerCleared => None,
        MapEvent::FolderLoaded { path, children } => {
            Some(format!("Listed {} ({} entries)", path, children))
        }
        MapEvent::FolderFailed { path, error } => Some(format!("! {}: {}", path, error)),
        MapEvent::DownloadSaved { path, bytes } => {
            Some(format!("Saved {} ({} bytes)", path.display(), bytes))
        }
        MapEvent::FileRequested => Some("Use 'open <file>' to add a local KML file".to_string()),
        MapEvent::PopupShown { title, .. } => Some(format!(
            "Popup: {}",
            title.as_deref().unwrap_or("(untitled feature)")
        )),
        MapEvent::PopupHidden => None,
        MapEvent::PrintExported { path } => Some(format!("Exported {}", path.display())),
        MapEvent::Alert { message } => Some(format!("! {}", message)),
    }
}
