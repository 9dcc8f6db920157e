//! Integration tests for the offline CLI commands.
//!
//! Each test runs the built binary with `HOME` pointed at a temporary
//! directory, so `~/.libermap/config.ini` never touches the real one.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run a CLI command under `home` and capture output.
fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_libermap"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command")
}

/// Assert a command succeeded.
fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!("{} failed:\nstdout: {}\nstderr: {}", context, stdout, stderr);
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["config", "path"]);
    assert_success(&output, "config path");

    let expected = home.path().join(".libermap").join("config.ini");
    assert_eq!(stdout(&output).trim(), expected.display().to_string());
}

#[test]
fn test_config_init_then_set_and_get() {
    let home = TempDir::new().unwrap();

    let output = run_cli(home.path(), &["config", "init"]);
    assert_success(&output, "config init");
    assert!(home.path().join(".libermap/config.ini").exists());

    let output = run_cli(home.path(), &["config", "set", "map.basemap", "imagery"]);
    assert_success(&output, "config set");

    let output = run_cli(home.path(), &["config", "get", "map.basemap"]);
    assert_success(&output, "config get");
    assert_eq!(stdout(&output).trim(), "imagery");
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let home = TempDir::new().unwrap();

    let output = run_cli(home.path(), &["config", "set", "map.default_zoom", "40"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(!home.path().join(".libermap/config.ini").exists());
}

#[test]
fn test_config_unknown_key() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["config", "get", "map.colour"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown configuration key"));
}

#[test]
fn test_config_list_shows_sections() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["config", "list"]);
    assert_success(&output, "config list");

    let text = stdout(&output);
    for section in ["[map]", "[layers]", "[search]", "[content]", "[print]", "[logging]"] {
        assert!(text.contains(section), "missing {} in:\n{}", section, text);
    }
    assert!(text.contains("max_active = 5"));
}

#[test]
fn test_basemaps_marks_configured_one() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["basemaps"]);
    assert_success(&output, "basemaps");

    let text = stdout(&output);
    let marked: Vec<&str> = text.lines().filter(|l| l.starts_with('*')).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].contains("greyscale"));
}

#[test]
fn test_print_rejects_unknown_basemap() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["print", "--basemap", "osm"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown basemap 'osm'"));
}
