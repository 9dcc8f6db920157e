//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`basemaps`] - Basemap catalogue
//! - [`browse`] - LiberData file tree (list, download)
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`layers`] - Load overlays and show the legend
//! - [`print`] - PNG export of the current view
//! - [`search`] - Location search
//! - [`shell`] - Interactive session driving the viewer loop

pub mod basemaps;
pub mod browse;
pub mod config;
pub mod layers;
pub mod print;
pub mod search;
pub mod shell;

use std::path::Path;

use libermap::viewer::Command;

/// Command that adds `source`: an existing file is loaded from disk,
/// anything else is treated as a URL.
pub fn source_command(source: &str) -> Command {
    let path = Path::new(source);
    if path.is_file() {
        Command::AddLocalFile {
            path: path.to_path_buf(),
        }
    } else {
        Command::ToggleUrl {
            url: source.to_string(),
        }
    }
}
