//! Layers command - load overlays and print the resulting legend.

use libermap::viewer::Command;

use super::source_command;
use crate::error::CliError;
use crate::runner::{drain_events, CliRunner, CliViewer};

/// Arguments for the layers command.
pub struct LayersArgs {
    /// URLs or local KML files, in add order
    pub sources: Vec<String>,
    /// Keys to hide after loading
    pub hide: Vec<String>,
}

/// Run the layers command.
pub async fn run(args: LayersArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("layers");
    let mut viewer = runner.create_viewer()?;
    let mut events = viewer.subscribe();

    load_sources(&mut viewer, &args.sources).await;
    for key in args.hide {
        viewer.dispatch(Command::SetLayerVisibility {
            key,
            visible: false,
        });
    }

    let failure = drain_events(&mut events);

    println!();
    print_legend(&viewer);
    match failure {
        Some(message) if viewer.registry().is_empty() => Err(CliError::Viewer(message)),
        _ => Ok(()),
    }
}

/// Add each source in order, waiting for each load before the next so the
/// registry order matches the argument order.
pub async fn load_sources(viewer: &mut CliViewer, sources: &[String]) {
    for source in sources {
        viewer.dispatch(source_command(source));
        viewer.settle().await;
    }
}

fn print_legend(viewer: &CliViewer) {
    let capacity = viewer
        .registry()
        .capacity()
        .map_or_else(|| "unlimited".to_string(), |c| c.to_string());
    println!("Layers ({} of {})", viewer.registry().len(), capacity);

    for item in viewer.legend().items() {
        let mark = if item.visible { "x" } else { " " };
        println!("  [{}] {:<32} {}", mark, item.label, item.key);
    }
}
