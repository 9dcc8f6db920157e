//! Basemaps command - show the basemap catalogue.

use libermap::basemap::catalog;
use libermap::config::ConfigFile;

use crate::error::CliError;

/// List every basemap with its tile sources, marking the configured one.
pub fn run() -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    for basemap in catalog() {
        let marker = if basemap.id == config.map.basemap {
            "*"
        } else {
            " "
        };
        println!("{} {:<12} {}", marker, basemap.id, basemap.display_name);
        for layer in &basemap.layers {
            println!("    {}", layer.url_template);
        }
    }

    Ok(())
}
