//! LiberMap CLI - Command-line interface
//!
//! This binary drives the LiberMap viewer headlessly: browse the LiberData
//! catalogue, load overlays, search locations, export PNG maps, or run an
//! interactive shell.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::browse::BrowseArgs;
use commands::config::ConfigCommands;
use commands::layers::LayersArgs;
use commands::print::PrintArgs;
use commands::search::SearchArgs;
use commands::shell::ShellArgs;

#[derive(Parser)]
#[command(name = "libermap")]
#[command(version = libermap::VERSION)]
#[command(about = "Hong Kong open-data map viewer", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available basemaps
    Basemaps,

    /// Browse the LiberData catalogue
    ///
    /// Without a path, lists the data categories. Paths are repository
    /// paths as shown in brackets, e.g. "Data_GML/保育%20Conservation".
    Browse {
        /// Directory to expand
        path: Option<String>,

        /// File to save into the download directory
        #[arg(long, value_name = "FILE_PATH")]
        download: Option<String>,
    },

    /// Search places with the location search service
    Search {
        /// Place name or address
        query: String,

        /// Show result N (zero-based) on the map
        #[arg(long, value_name = "N")]
        select: Option<usize>,
    },

    /// Load overlays and print the legend
    Layers {
        /// KML URLs, WMS URLs, or local KML files
        #[arg(required = true)]
        sources: Vec<String>,

        /// Layer key to hide after loading (repeatable)
        #[arg(long)]
        hide: Vec<String>,
    },

    /// Export the map as a PNG
    Print {
        /// Overlays to draw: KML URLs or local KML files
        sources: Vec<String>,

        /// Basemap to print on (topographic, imagery, greyscale)
        #[arg(long)]
        basemap: Option<String>,

        /// Output directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Interactive session
    Shell {
        /// Device position for the my-location control, as lon,lat
        #[arg(long, value_name = "LON,LAT")]
        position: Option<String>,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;

    let result = match cli.command {
        Commands::Basemaps => commands::basemaps::run(),
        Commands::Browse { path, download } => {
            commands::browse::run(BrowseArgs { path, download }, debug).await
        }
        Commands::Search { query, select } => {
            commands::search::run(SearchArgs { query, select }, debug).await
        }
        Commands::Layers { sources, hide } => {
            commands::layers::run(LayersArgs { sources, hide }, debug).await
        }
        Commands::Print {
            sources,
            basemap,
            output,
        } => {
            commands::print::run(
                PrintArgs {
                    sources,
                    basemap,
                    output_dir: output,
                },
                debug,
            )
            .await
        }
        Commands::Shell { position } => commands::shell::run(ShellArgs { position }, debug).await,
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
