//! Search command - query the location search service.

use libermap::coord::{self, Projection};
use libermap::map::{MapView, MarkerSlot};
use libermap::search::SearchProvider;
use libermap::viewer::Command;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the search command.
pub struct SearchArgs {
    pub query: String,
    /// Result to pick, zero-based
    pub select: Option<usize>,
}

/// Run the search command.
pub async fn run(args: SearchArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("search");
    let mut viewer = runner.create_viewer()?;

    viewer.dispatch(Command::SetSearchProvider(SearchProvider::LocationSearch));
    viewer.dispatch(Command::SearchInput {
        text: args.query.clone(),
    });
    viewer.settle().await;

    let results = viewer.search().results();
    if results.is_empty() {
        println!("No results for '{}'", args.query);
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let address = result
            .raw
            .address_en
            .as_deref()
            .or(result.raw.address_zh.as_deref())
            .unwrap_or("");
        println!(
            "{:>2}. {}  {}  ({:.0}, {:.0})",
            i, result.display_name, address, result.grid.x, result.grid.y
        );
    }

    if let Some(index) = args.select {
        if index >= results.len() {
            return Err(CliError::Usage(format!(
                "No result {}; there are {}",
                index,
                results.len()
            )));
        }
        viewer.dispatch(Command::SelectResult { index });

        let pin = viewer
            .map()
            .marker(MarkerSlot::Search)
            .ok_or_else(|| CliError::Viewer("Result could not be shown".to_string()))?;
        let lon_lat = coord::to_lon_lat(pin, Projection::WebMercator)
            .map_err(|e| CliError::Viewer(e.to_string()))?;
        println!();
        println!(
            "{} at {:.5}, {:.5} (zoom {})",
            viewer.search().input_text(),
            lon_lat.x,
            lon_lat.y,
            viewer.map().view().zoom
        );
    }

    Ok(())
}
