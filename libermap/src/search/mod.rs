//! Place search.
//!
//! Two providers share one search box. The places provider is driven from
//! outside (its widget reports candidate places); the location provider
//! queries the government location search API as the user types.
//!
//! Location replies arrive asynchronously and may come back out of order.
//! Each keystroke bumps a generation counter and replies carrying an older
//! generation are dropped.

mod marker;

pub use marker::{PinMarker, DEFAULT_MARKER_TIMEOUT};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::coord::{self, CoordError, Coordinate, Projection};
use crate::fetch::LocationResult;

pub const DEFAULT_MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_RESULT_ZOOM: f64 = 15.0;
/// Camera move duration when jumping to a result.
pub const RESULT_ANIMATION: Duration = Duration::from_millis(1000);

/// Search backend behind the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchProvider {
    #[default]
    Places,
    LocationSearch,
}

impl SearchProvider {
    pub const ALL: [SearchProvider; 2] = [SearchProvider::Places, SearchProvider::LocationSearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Places => "places",
            SearchProvider::LocationSearch => "location",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SearchProvider::Places => "Google Places",
            SearchProvider::LocationSearch => "Location Search API",
        }
    }

    pub fn input_id(&self) -> &'static str {
        match self {
            SearchProvider::Places => "google-search-input",
            SearchProvider::LocationSearch => "location-search-input",
        }
    }

    pub fn placeholder(&self) -> String {
        format!("Search {}...", self.display_name())
    }

    /// Accessible label of the provider dropdown while this one is active.
    pub fn toggle_aria_label(&self) -> String {
        format!("{} (click to change)", self.display_name())
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchProvider {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "places" | "google" => Ok(SearchProvider::Places),
            "location" | "locationsearch" | "location-search" => Ok(SearchProvider::LocationSearch),
            _ => Err(SearchError::UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("Unknown search provider '{0}' (expected places or location)")]
    UnknownProvider(String),

    #[error("No search result at index {0}")]
    NoSuchResult(usize),

    #[error("Cannot place search result: {0}")]
    Projection(#[from] CoordError),
}

/// Tunables read from the `[search]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub min_query_chars: usize,
    pub max_results: usize,
    pub result_zoom: f64,
    pub marker_timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            max_results: DEFAULT_MAX_RESULTS,
            result_zoom: DEFAULT_RESULT_ZOOM,
            marker_timeout: DEFAULT_MARKER_TIMEOUT,
        }
    }
}

/// One entry in the location results list.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub display_name: String,
    /// Position in HK 1980 Grid metres
    pub grid: Coordinate,
    pub raw: LocationResult,
}

impl From<LocationResult> for SearchResult {
    fn from(raw: LocationResult) -> Self {
        Self {
            display_name: raw.name_zh.clone(),
            grid: Coordinate::new(raw.x, raw.y),
            raw,
        }
    }
}

/// Candidate reported by the places widget.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub name: String,
    /// WGS84 lon/lat, absent for places without geometry
    pub location: Option<Coordinate>,
}

/// What to do after the location input changed.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// Query too short; results were hidden.
    HideResults,
    /// Issue a lookup tagged with `generation`.
    Fetch { generation: u64, query: String },
}

/// Search box state.
#[derive(Debug)]
pub struct SearchState {
    active: SearchProvider,
    settings: SearchOptions,
    input_text: String,
    results: Vec<SearchResult>,
    results_visible: bool,
    generation: u64,
}

impl SearchState {
    pub fn new(active: SearchProvider, settings: SearchOptions) -> Self {
        Self {
            active,
            settings,
            input_text: String::new(),
            results: Vec::new(),
            results_visible: false,
            generation: 0,
        }
    }

    pub fn active(&self) -> SearchProvider {
        self.active
    }

    pub fn settings(&self) -> &SearchOptions {
        &self.settings
    }

    /// Only the active provider's input is shown.
    pub fn is_input_visible(&self, provider: SearchProvider) -> bool {
        provider == self.active
    }

    /// Make `provider` active.
    ///
    /// Clears the results and invalidates in-flight lookups. Returns false
    /// when it was already active. The caller clears the pin.
    pub fn set_active(&mut self, provider: SearchProvider) -> bool {
        if provider == self.active {
            return false;
        }
        self.active = provider;
        self.results.clear();
        self.results_visible = false;
        self.generation += 1;
        debug!(provider = %provider, "Search provider changed");
        true
    }

    /// Location input changed to `text`.
    pub fn on_location_input(&mut self, text: &str) -> InputAction {
        self.input_text = text.to_string();
        self.generation += 1;

        if text.chars().count() < self.settings.min_query_chars {
            self.results_visible = false;
            return InputAction::HideResults;
        }
        InputAction::Fetch {
            generation: self.generation,
            query: text.to_string(),
        }
    }

    /// Install a lookup reply. Returns false when the reply is stale or the
    /// location provider is no longer active.
    pub fn apply_location_results(&mut self, generation: u64, results: Vec<LocationResult>) -> bool {
        if generation != self.generation || self.active != SearchProvider::LocationSearch {
            trace!(
                generation,
                current = self.generation,
                "Discarding stale location results"
            );
            return false;
        }
        self.results = results
            .into_iter()
            .take(self.settings.max_results)
            .map(SearchResult::from)
            .collect();
        self.results_visible = !self.results.is_empty();
        debug!(count = self.results.len(), "Location results updated");
        true
    }

    /// Pick result `index`; returns its position in `view_projection`.
    ///
    /// The input shows the result name and the list is hidden.
    pub fn select_result(
        &mut self,
        index: usize,
        view_projection: Projection,
    ) -> Result<Coordinate, SearchError> {
        let result = self
            .results
            .get(index)
            .ok_or(SearchError::NoSuchResult(index))?;
        let position = coord::transform(result.grid, Projection::Hk1980Grid, view_projection)?;

        self.input_text = result.display_name.clone();
        self.results_visible = false;
        Ok(position)
    }

    /// Position of the first candidate in `view_projection`, or `None`
    /// when there is nothing to show.
    pub fn resolve_places(
        &self,
        places: &[PlaceCandidate],
        view_projection: Projection,
    ) -> Result<Option<Coordinate>, SearchError> {
        let Some(location) = places.first().and_then(|p| p.location) else {
            return Ok(None);
        };
        Ok(Some(coord::from_lon_lat(location, view_projection)?))
    }

    pub fn hide_results(&mut self) {
        self.results_visible = false;
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn result_names(&self) -> Vec<String> {
        self.results.iter().map(|r| r.display_name.clone()).collect()
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
