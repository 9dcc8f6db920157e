//! Map control buttons.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Operation behind a control button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    MyLocation,
    Home,
    AddLayer,
    Print,
    /// Open or close the basemap menu
    Basemap,
}

impl ControlAction {
    pub const ALL: [ControlAction; 5] = [
        ControlAction::MyLocation,
        ControlAction::Home,
        ControlAction::AddLayer,
        ControlAction::Print,
        ControlAction::Basemap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::MyLocation => "mylocation",
            ControlAction::Home => "home",
            ControlAction::AddLayer => "addlayer",
            ControlAction::Print => "print",
            ControlAction::Basemap => "basemap",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown control '{0}'")]
pub struct UnknownControl(pub String);

impl FromStr for ControlAction {
    type Err = UnknownControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        ControlAction::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| UnknownControl(s.to_string()))
    }
}

/// Descriptor of an icon button on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlButton {
    pub id: String,
    pub icon: String,
    /// Accessible name; the icon itself is presentational
    pub aria_label: String,
    pub action: ControlAction,
}

impl ControlButton {
    pub fn class_name(&self) -> &'static str {
        "map-control-button"
    }

    /// Keyboard activation: Enter and Space behave like a click.
    pub fn activates_on_key(key: &str) -> bool {
        matches!(key, "Enter" | " ")
    }
}

pub fn create_button(
    id: impl Into<String>,
    icon: impl Into<String>,
    label: impl Into<String>,
    action: ControlAction,
) -> ControlButton {
    ControlButton {
        id: id.into(),
        icon: icon.into(),
        aria_label: label.into(),
        action,
    }
}

/// Buttons shown on every map, top to bottom.
pub fn default_controls() -> Vec<ControlButton> {
    vec![
        create_button(
            "mylocation-button",
            "./img/myLocation.png",
            "My Location",
            ControlAction::MyLocation,
        ),
        create_button("home-button", "./img/home.png", "Home", ControlAction::Home),
        create_button(
            "addLayer-button",
            "./img/addLayer.png",
            "Add Layer",
            ControlAction::AddLayer,
        ),
        create_button("print-button", "./img/print.png", "Print Map", ControlAction::Print),
        create_button(
            "basemap-button",
            "img/basemap.png",
            "Change Basemap",
            ControlAction::Basemap,
        ),
    ]
}
