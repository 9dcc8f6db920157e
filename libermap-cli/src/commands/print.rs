//! Print command - export the map to a PNG.

use std::path::PathBuf;

use libermap::controls::ControlAction;
use libermap::events::MapEvent;
use libermap::viewer::Command;
use tracing::info;

use super::layers::load_sources;
use crate::error::CliError;
use crate::runner::{describe_event, CliRunner};

/// Arguments for the print command.
pub struct PrintArgs {
    /// Overlays to draw, URLs or local files
    pub sources: Vec<String>,
    /// Basemap to print on instead of the configured one
    pub basemap: Option<String>,
    /// Output directory instead of the configured one
    pub output_dir: Option<PathBuf>,
}

/// Run the print command.
pub async fn run(args: PrintArgs, debug: bool) -> Result<(), CliError> {
    let mut runner = CliRunner::with_debug(debug)?;
    runner.log_startup("print");
    if let Some(dir) = args.output_dir {
        runner.set_print_dir(dir);
    }
    let mut viewer = runner.create_viewer()?;

    if let Some(name) = &args.basemap {
        if name.parse::<libermap::basemap::BasemapId>().is_err() {
            return Err(CliError::Usage(format!("Unknown basemap '{}'", name)));
        }
        viewer.dispatch(Command::SwitchBasemap { name: name.clone() });
    }
    load_sources(&mut viewer, &args.sources).await;

    let mut events = viewer.subscribe();
    viewer.dispatch(Command::Control(ControlAction::Print));
    viewer.settle().await;

    while let Ok(event) = events.try_recv() {
        match event {
            MapEvent::PrintExported { path } => {
                info!(path = %path.display(), "Print complete");
                println!("Exported {}", path.display());
                return Ok(());
            }
            MapEvent::Alert { message } => return Err(CliError::Viewer(message)),
            other => {
                if let Some(line) = describe_event(&other) {
                    println!("{}", line);
                }
            }
        }
    }
    Err(CliError::Viewer("Print produced no output".to_string()))
}
