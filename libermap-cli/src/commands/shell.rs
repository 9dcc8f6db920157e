//! Shell command - interactive session on a live viewer.
//!
//! Lines read from stdin are parsed into viewer commands and fed to
//! [`Viewer::run`](libermap::viewer::Viewer::run). Every event the viewer
//! publishes is printed as it happens. The session ends on `quit` or at
//! end of input.

use std::io::BufRead;
use std::sync::Arc;

use libermap::controls::ControlAction;
use libermap::coord::{self, Coordinate, Projection};
use libermap::geolocation::StaticGeolocator;
use libermap::search::{PlaceCandidate, SearchProvider};
use libermap::viewer::Command;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::source_command;
use crate::error::CliError;
use crate::runner::{describe_event, CliRunner};

const HELP: &str = "\
Files:    folder <path> | file <path> | download <path> | files
Layers:   add <url|file> | show <key> | hide <key> | legend
Map:      basemap [name] | click <lon> <lat> | close | home | locate | print | open
Search:   provider <places|location> | find <text> | select <n> | place <lon> <lat> [name]
Session:  help | quit";

/// Arguments for the shell command.
pub struct ShellArgs {
    /// Device position reported to the my-location control, as `lon,lat`
    pub position: Option<String>,
}

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    Viewer(Command),
    Help,
    Quit,
}

/// Run the shell command.
pub async fn run(args: ShellArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("shell");
    let mut viewer = runner.create_viewer()?;

    if let Some(position) = &args.position {
        let (lon, lat) = parse_lon_lat_pair(position).map_err(CliError::Usage)?;
        viewer = viewer.with_geolocator(Arc::new(StaticGeolocator::new(lon, lat)));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let printer = tokio::spawn(print_events(viewer.subscribe()));
    let stop = shutdown.clone();
    std::thread::spawn(move || read_commands(tx, stop));

    println!(
        "LiberMap {} - basemap {}. Type 'help' for commands.",
        libermap::VERSION,
        viewer.basemap().current_id()
    );
    viewer.run(rx, shutdown).await;

    // Closing the event bus lets the printer drain and stop.
    drop(viewer);
    let _ = printer.await;
    Ok(())
}

/// Blocking stdin reader. Runs on its own thread so a pending read never
/// holds up shutdown.
fn read_commands(tx: mpsc::UnboundedSender<Command>, shutdown: CancellationToken) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to read input");
                eprintln!("Failed to read input: {}", e);
                break;
            }
        };

        match parse_line(&line) {
            Ok(Some(ShellInput::Viewer(command))) => {
                if tx.send(command).is_err() {
                    return;
                }
            }
            Ok(Some(ShellInput::Help)) => println!("{}", HELP),
            Ok(Some(ShellInput::Quit)) => {
                shutdown.cancel();
                return;
            }
            Ok(None) => {}
            Err(message) => eprintln!("{}", message),
        }
    }
    info!("End of input");
}

async fn print_events(mut events: broadcast::Receiver<libermap::events::MapEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = describe_event(&event) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellInput>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "help" | "?" => return Ok(Some(ShellInput::Help)),
        "quit" | "exit" => return Ok(Some(ShellInput::Quit)),

        "folder" => Command::ToggleFolder {
            path: required(rest, "folder <path>")?,
        },
        "file" => Command::ToggleFile {
            path: required(rest, "file <path>")?,
        },
        "download" => Command::DownloadFile {
            path: required(rest, "download <path>")?,
        },
        "files" => Command::ToggleFilePanel,

        "add" => source_command(&required(rest, "add <url|file>")?),
        "show" | "hide" => Command::SetLayerVisibility {
            key: required(rest, "show|hide <key>")?,
            visible: word.eq_ignore_ascii_case("show"),
        },
        "legend" => Command::ToggleLegendPanel,

        "basemap" if rest.is_empty() => Command::Control(ControlAction::Basemap),
        "basemap" => Command::SwitchBasemap {
            name: rest.to_string(),
        },
        "click" => {
            let (lon, lat) = parse_lon_lat(rest)?;
            let position = coord::from_lon_lat(Coordinate::lon_lat(lon, lat), Projection::WebMercator)
                .map_err(|e| e.to_string())?;
            Command::MapClick { position }
        }
        "close" => Command::ClosePopup,
        "home" => Command::Control(ControlAction::Home),
        "locate" => Command::Control(ControlAction::MyLocation),
        "print" => Command::Control(ControlAction::Print),
        "open" => Command::Control(ControlAction::AddLayer),

        "provider" => {
            let provider: SearchProvider = rest.parse().map_err(|e| format!("{}", e))?;
            Command::SetSearchProvider(provider)
        }
        "find" => Command::SearchInput {
            text: rest.to_string(),
        },
        "select" => {
            let index = rest
                .parse()
                .map_err(|_| "Usage: select <n>".to_string())?;
            Command::SelectResult { index }
        }
        "place" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let coords = format!(
                "{} {}",
                parts.next().unwrap_or(""),
                parts.next().unwrap_or("")
            );
            let (lon, lat) = parse_lon_lat(&coords)?;
            let name = parts.next().unwrap_or("").trim().to_string();
            Command::PlacesChanged {
                places: vec![PlaceCandidate {
                    name,
                    location: Some(Coordinate::lon_lat(lon, lat)),
                }],
            }
        }

        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(Some(ShellInput::Viewer(command)))
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

/// `<lon> <lat>` separated by whitespace.
fn parse_lon_lat(text: &str) -> Result<(f64, f64), String> {
    let usage = || "Expected <lon> <lat> in decimal degrees".to_string();
    let mut parts = text.split_whitespace();
    let lon = parts.next().and_then(|s| s.parse().ok()).ok_or_else(usage)?;
    let lat = parts.next().and_then(|s| s.parse().ok()).ok_or_else(usage)?;
    Ok((lon, lat))
}

/// `lon,lat` as given to `--position`.
fn parse_lon_lat_pair(text: &str) -> Result<(f64, f64), String> {
    let (lon, lat) = text
        .split_once(',')
        .ok_or_else(|| format!("Invalid position '{}', expected lon,lat", text))?;
    parse_lon_lat(&format!("{} {}", lon.trim(), lat.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_line(line) {
            Ok(Some(ShellInput::Viewer(command))) => command,
            other => panic!("expected a viewer command for '{}', got {:?}", line, other),
        }
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# note"), Ok(None));
    }

    #[test]
    fn test_session_words() {
        assert_eq!(parse_line("help"), Ok(Some(ShellInput::Help)));
        assert_eq!(parse_line("EXIT"), Ok(Some(ShellInput::Quit)));
    }

    #[test]
    fn test_path_keeps_spaces() {
        assert_eq!(
            command("folder Data_GML/保育%20Conservation"),
            Command::ToggleFolder {
                path: "Data_GML/保育%20Conservation".into()
            }
        );
    }

    #[test]
    fn test_visibility_commands() {
        assert_eq!(
            command("hide parks.kml"),
            Command::SetLayerVisibility {
                key: "parks.kml".into(),
                visible: false
            }
        );
        assert_eq!(
            command("show parks.kml"),
            Command::SetLayerVisibility {
                key: "parks.kml".into(),
                visible: true
            }
        );
    }

    #[test]
    fn test_basemap_with_and_without_name() {
        assert_eq!(command("basemap"), Command::Control(ControlAction::Basemap));
        assert_eq!(
            command("basemap imagery"),
            Command::SwitchBasemap {
                name: "imagery".into()
            }
        );
    }

    #[test]
    fn test_search_commands() {
        assert_eq!(
            command("provider location"),
            Command::SetSearchProvider(SearchProvider::LocationSearch)
        );
        assert_eq!(
            command("find 中環 碼頭"),
            Command::SearchInput {
                text: "中環 碼頭".into()
            }
        );
        assert_eq!(command("select 2"), Command::SelectResult { index: 2 });
        assert!(parse_line("select two").is_err());
        assert!(parse_line("provider bing").is_err());
    }

    #[test]
    fn test_place_with_name() {
        assert_eq!(
            command("place 114.17 22.30 Victoria Park"),
            Command::PlacesChanged {
                places: vec![PlaceCandidate {
                    name: "Victoria Park".into(),
                    location: Some(Coordinate::lon_lat(114.17, 22.30)),
                }]
            }
        );
    }

    #[test]
    fn test_click_projects_to_view() {
        let Command::MapClick { position } = command("click 0 0") else {
            panic!("expected a click");
        };
        assert!(position.x.abs() < 1e-6 && position.y.abs() < 1e-6);
        assert!(parse_line("click 114.1").is_err());
    }

    #[test]
    fn test_missing_argument_reports_usage() {
        assert_eq!(parse_line("file"), Err("Usage: file <path>".to_string()));
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_line("zoom 12").unwrap_err().contains("Unknown command"));
    }

    #[test]
    fn test_position_pair() {
        assert_eq!(parse_lon_lat_pair("114.17, 22.30"), Ok((114.17, 22.30)));
        assert!(parse_lon_lat_pair("114.17").is_err());
    }
}
