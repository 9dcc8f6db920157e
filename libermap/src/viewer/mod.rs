//! The viewer: single owner of all map state.
//!
//! Every component (registry, legend, basemap, search, file tree, popup) is
//! mutated from one place. User intents arrive as [`Command`]s; network
//! fetches, exports and the pin timer run as spawned tasks that post a
//! [`Message`] back. Observers follow along on the [`EventBus`].
//!
//! # Design Notes
//!
//! Nothing outside the loop holds a reference into viewer state, so no
//! locking is needed. The registry is the single source of truth for which
//! overlays are shown and the legend is rebuilt from it after every change.
//!
//! Two entry points drive the loop:
//!
//! - [`Viewer::run`] for long-lived sessions, until the command channel
//!   closes or shutdown is signalled
//! - [`Viewer::settle`] for one-shot use and tests: handles completions
//!   until no spawned fetch, download or export is outstanding

mod command;

pub use command::{Command, LoadError, Message, FILE_READ_ALERT};

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::basemap::{BasemapId, BasemapSwitcher};
use crate::config::ConfigFile;
use crate::controls::ControlAction;
use crate::coord::{self, CoordError, Coordinate, Extent, Projection};
use crate::events::{EventBus, MapEvent, RemovalReason};
use crate::fetch::{AsyncHttpClient, ContentsClient, FetchError, LocationSearchClient};
use crate::filetree::{FileTree, NodeKind, ToggleOutcome};
use crate::geolocation::{Geolocator, UNSUPPORTED_MESSAGE};
use crate::kml::{self, Feature};
use crate::legend::{self, LegendSynchronizer};
use crate::map::{MapLayer, MapView, MarkerSlot, ViewAnimation};
use crate::popup::PopupState;
use crate::print::{self, PrintJob, PrintOptions};
use crate::registry::{LayerRegistry, ToggleButton};
use crate::search::{
    InputAction, PinMarker, PlaceCandidate, SearchOptions, SearchProvider, SearchState,
    RESULT_ANIMATION,
};
use crate::style::default_style;

/// Camera move after a layer is added.
pub const LAYER_FIT_DURATION: Duration = Duration::from_millis(1500);

/// Camera move for the home and my-location controls.
pub const CONTROL_ANIMATION: Duration = Duration::from_millis(1500);

/// Zoom used when centring on the device position.
pub const LOCATION_ZOOM: f64 = 15.0;

/// Startup settings of a [`Viewer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    /// Home view centre as lon/lat
    pub home: Coordinate,
    pub home_zoom: f64,
    pub basemap: BasemapId,
    /// `None` keeps every layer
    pub layer_capacity: Option<usize>,
    pub search_provider: SearchProvider,
    pub search: SearchOptions,
    pub print: PrintOptions,
    pub contents_url: String,
    pub location_search_url: String,
    pub download_dir: PathBuf,
}

impl ViewerOptions {
    pub fn from_config(config: &ConfigFile) -> Self {
        Self {
            home: config.home(),
            home_zoom: config.map.default_zoom,
            basemap: config.map.basemap,
            layer_capacity: config.layer_capacity(),
            search_provider: config.search.provider,
            search: config.search_options(),
            print: config.print_options(),
            contents_url: config.content.contents_url.clone(),
            location_search_url: config.search.location_search_url.clone(),
            download_dir: config.content.download_dir.clone(),
        }
    }

    /// Home centre in `projection`, for constructing the initial map view.
    pub fn home_in(&self, projection: Projection) -> Result<Coordinate, CoordError> {
        coord::from_lon_lat(self.home, projection)
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self::from_config(&ConfigFile::default())
    }
}

/// Owner of the map and every piece of UI state around it.
pub struct Viewer<C, M> {
    map: M,
    http: C,
    contents: ContentsClient<C>,
    location: LocationSearchClient<C>,
    options: ViewerOptions,

    registry: LayerRegistry,
    legend: LegendSynchronizer,
    basemap: BasemapSwitcher,
    search: SearchState,
    pin: PinMarker,
    tree: FileTree,
    popup: PopupState,
    basemap_panel_open: bool,

    /// Parsed content by source URL; re-adding a layer never refetches.
    cache: HashMap<String, Arc<Vec<Feature>>>,
    /// Layers being fetched, with the button that asked for them.
    pending_loads: HashMap<String, Option<ToggleButton>>,

    geolocator: Option<Arc<dyn Geolocator>>,
    events: EventBus,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    /// Spawned tasks whose message has not been handled yet.
    in_flight: usize,
}

impl<C, M> Viewer<C, M>
where
    C: AsyncHttpClient + Clone + 'static,
    M: MapView,
{
    /// Create a viewer around `map` and install the startup basemap.
    pub fn new(mut map: M, http: C, options: ViewerOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut basemap = BasemapSwitcher::new(options.basemap);
        basemap.install(&mut map);

        info!(
            basemap = %options.basemap,
            capacity = ?options.layer_capacity,
            provider = %options.search_provider,
            "Viewer created"
        );

        Self {
            contents: ContentsClient::new(http.clone(), options.contents_url.clone()),
            location: LocationSearchClient::new(http.clone(), options.location_search_url.clone()),
            http,
            registry: LayerRegistry::new(options.layer_capacity),
            legend: LegendSynchronizer::new(),
            basemap,
            search: SearchState::new(options.search_provider, options.search.clone()),
            pin: PinMarker::new(options.search.marker_timeout),
            tree: FileTree::with_default_categories(),
            popup: PopupState::default(),
            basemap_panel_open: false,
            cache: HashMap::new(),
            pending_loads: HashMap::new(),
            geolocator: None,
            events: EventBus::default(),
            tx,
            rx,
            in_flight: 0,
            map,
            options,
        }
    }

    /// Enable the my-location control.
    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn legend(&self) -> &LegendSynchronizer {
        &self.legend
    }

    pub fn basemap(&self) -> &BasemapSwitcher {
        &self.basemap
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn pin(&self) -> &PinMarker {
        &self.pin
    }

    pub fn file_tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn is_basemap_panel_open(&self) -> bool {
        self.basemap_panel_open
    }

    /// True while a layer with this key is being fetched.
    pub fn is_loading(&self, key: &str) -> bool {
        self.pending_loads.contains_key(key)
    }

    /// True while spawned work has not reported back.
    pub fn has_pending_work(&self) -> bool {
        self.in_flight > 0
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Process commands and completions until `shutdown` fires or the
    /// command channel closes.
    pub async fn run(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
    ) {
        info!("Viewer loop starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Viewer loop shutting down");
                    break;
                }

                Some(message) = self.rx.recv() => {
                    self.handle_message(message);
                }

                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => {
                        debug!("Command channel closed");
                        break;
                    }
                },
            }
        }

        self.pin.cancel_timer();
        debug!("Viewer loop stopped");
    }

    /// Handle completions until no spawned work is outstanding.
    ///
    /// Pin timers are not waited for.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(message) => self.handle_message(message),
                None => break,
            }
        }
    }

    /// Apply one user command.
    pub fn dispatch(&mut self, command: Command) {
        debug!(?command, "Command");

        match command {
            Command::ToggleFolder { path } => self.toggle_folder(&path),
            Command::ToggleFile { path } => match self.file_leaf(&path) {
                Some((url, button)) => self.toggle_layer(url, Some(button)),
                None => debug!(path = %path, "No file with a download URL at path"),
            },
            Command::DownloadFile { path } => self.download_file(&path),
            Command::ToggleFilePanel => {
                let open = self.tree.toggle_panel();
                debug!(open, "File panel toggled");
            }
            Command::ToggleUrl { url } => self.toggle_layer(url, None),
            Command::AddLocalFile { path } => self.add_local_file(path),
            Command::SetLayerVisibility { key, visible } => {
                if self.legend.set_visibility(&mut self.map, &key, visible) {
                    self.events.publish(MapEvent::LegendRebuilt {
                        items: self.legend.items().to_vec(),
                    });
                } else {
                    debug!(key = %key, "No legend item for key");
                }
            }
            Command::ToggleLegendPanel => {
                let open = self.legend.toggle_panel();
                debug!(open, "Legend panel toggled");
            }
            Command::SwitchBasemap { name } => {
                self.basemap
                    .switch_to_named(&mut self.map, &name, &self.events);
                self.basemap_panel_open = false;
            }
            Command::SetSearchProvider(provider) => self.set_search_provider(provider),
            Command::SearchInput { text } => self.search_input(&text),
            Command::SelectResult { index } => self.select_result(index),
            Command::PlacesChanged { places } => self.places_changed(&places),
            Command::MapClick { position } => self.map_click(position),
            Command::ClosePopup => {
                if self.popup.close() {
                    self.events.publish(MapEvent::PopupHidden);
                }
            }
            Command::Control(action) => self.control(action),
        }
    }

    /// Apply one completion from a spawned task.
    pub fn handle_message(&mut self, message: Message) {
        if message.is_tracked() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        debug!(kind = message.kind(), "Message");

        match message {
            Message::FolderListed { path, result } => match result {
                Ok(entries) => {
                    if let Some(children) = self.tree.apply_listing(&path, entries) {
                        self.events
                            .publish(MapEvent::FolderLoaded { path, children });
                    }
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Failed to list folder");
                    self.tree.listing_failed(&path);
                    self.events.publish(MapEvent::FolderFailed {
                        path,
                        error: e.to_string(),
                    });
                }
            },

            Message::LayerFetched { key, result } => {
                let Some(button) = self.pending_loads.remove(&key) else {
                    debug!(key = %key, "Unrequested layer content ignored");
                    return;
                };
                match result {
                    Ok(features) => {
                        let features = Arc::new(features);
                        self.cache.insert(key.clone(), Arc::clone(&features));
                        self.add_features(&key, features, button);
                    }
                    Err(e) => {
                        error!(key = %key, error = %e, "Failed to load layer");
                        self.events.publish(MapEvent::LayerFailed {
                            key,
                            error: e.to_string(),
                        });
                    }
                }
            }

            Message::LocalFileLoaded { key, result } => match result {
                Ok(features) => self.add_features(&key, Arc::new(features), None),
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to load local file");
                    self.alert(FILE_READ_ALERT);
                    self.events.publish(MapEvent::LayerFailed {
                        key,
                        error: e.to_string(),
                    });
                }
            },

            Message::LocationResults { generation, result } => match result {
                Ok(results) => {
                    if self.search.apply_location_results(generation, results) {
                        self.publish_results();
                    }
                }
                Err(e) => warn!(generation, error = %e, "Location search failed"),
            },

            Message::MarkerExpired { seq } => {
                if self.pin.expire(&mut self.map, seq) {
                    self.events.publish(MapEvent::MarkerCleared);
                }
            }

            Message::DownloadFinished { url, result } => match result {
                Ok((path, bytes)) => {
                    info!(url = %url, path = %path.display(), bytes, "Download saved");
                    self.events.publish(MapEvent::DownloadSaved { path, bytes });
                }
                Err(e) => {
                    error!(url = %url, error = %e, "Download failed");
                    self.alert(&format!("Download failed: {}", e));
                }
            },

            Message::PrintFinished { result } => match result {
                Ok(path) => self.events.publish(MapEvent::PrintExported { path }),
                Err(e) => {
                    error!(error = %e, "Print failed");
                    self.alert(&format!("Print failed: {}", e));
                }
            },
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn alert(&self, message: &str) {
        self.events.publish(MapEvent::Alert {
            message: message.to_string(),
        });
    }

    // =========================================================================
    // File tree
    // =========================================================================

    fn toggle_folder(&mut self, path: &str) {
        let Some(id) = self.tree.find_by_path(path) else {
            debug!(path = path, "Unknown folder");
            return;
        };
        match self.tree.toggle(id) {
            Some(ToggleOutcome::FetchRequired { path }) => {
                let contents = self.contents.clone();
                self.spawn(async move {
                    let result = contents.list_directory(&path).await;
                    Message::FolderListed { path, result }
                });
            }
            Some(outcome) => debug!(path = path, ?outcome, "Folder toggled"),
            None => debug!(path = path, "Not a folder"),
        }
    }

    /// Download URL and button of the file leaf at `path`.
    fn file_leaf(&self, path: &str) -> Option<(String, ToggleButton)> {
        let node = self.tree.find_by_path(path).and_then(|id| self.tree.node(id))?;
        match &node.kind {
            NodeKind::File {
                download_url: Some(url),
                button,
            } => Some((url.clone(), button.clone())),
            _ => None,
        }
    }

    fn download_file(&mut self, path: &str) {
        let Some((url, _)) = self.file_leaf(path) else {
            debug!(path = path, "No file with a download URL at path");
            return;
        };
        let target = self.options.download_dir.join(legend::file_name(&url));
        let http = self.http.clone();
        self.spawn(async move {
            let result = save_download(&http, &url, &target).await;
            Message::DownloadFinished { url, result }
        });
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    /// Remove the layer if shown, otherwise load and add it.
    fn toggle_layer(&mut self, url: String, button: Option<ToggleButton>) {
        if self.registry.has(&url) {
            self.remove_overlay(&url);
            return;
        }
        if self.pending_loads.contains_key(&url) {
            debug!(key = %url, "Layer already loading");
            return;
        }
        if legend::is_wms(&url) {
            self.add_overlay(&url, MapLayer::wms(url.clone()), button, None, 0);
            return;
        }
        if let Some(features) = self.cache.get(&url).cloned() {
            debug!(key = %url, "Layer content from cache");
            self.add_features(&url, features, button);
            return;
        }

        self.pending_loads.insert(url.clone(), button);
        let contents = self.contents.clone();
        let projection = self.map.view().projection;
        self.spawn(async move {
            let result = match contents.fetch_text(&url).await {
                Ok(text) => kml::parse_kml(&text, projection).map_err(LoadError::from),
                Err(e) => Err(LoadError::from(e)),
            };
            Message::LayerFetched { key: url, result }
        });
    }

    fn add_local_file(&mut self, path: PathBuf) {
        let Some(key) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            warn!(path = %path.display(), "Not a file path");
            self.alert(FILE_READ_ALERT);
            return;
        };
        let projection = self.map.view().projection;
        self.spawn(async move {
            let read = tokio::fs::read_to_string(&path).await;
            let result = match read {
                Ok(text) => kml::parse_kml(&text, projection).map_err(LoadError::from),
                Err(source) => Err(LoadError::Read { path, source }),
            };
            Message::LocalFileLoaded { key, result }
        });
    }

    fn add_features(&mut self, key: &str, features: Arc<Vec<Feature>>, button: Option<ToggleButton>) {
        let extent = kml::features_extent(&features);
        let count = features.len();
        self.add_overlay(key, MapLayer::vector(features, default_style), button, extent, count);
    }

    fn add_overlay(
        &mut self,
        key: &str,
        layer: MapLayer,
        button: Option<ToggleButton>,
        extent: Option<Extent>,
        features: usize,
    ) {
        let evicted = match self.registry.add(&mut self.map, key, layer, button) {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(error = %e, "Layer not added");
                return;
            }
        };

        for entry in evicted {
            self.events.publish(MapEvent::LayerRemoved {
                key: entry.key,
                reason: RemovalReason::Evicted,
            });
        }
        self.events.publish(MapEvent::LayerAdded {
            key: key.to_string(),
            features,
        });
        if let Some(extent) = extent {
            self.map.fit(extent, LAYER_FIT_DURATION);
        }
        self.refresh_legend();
    }

    fn remove_overlay(&mut self, key: &str) {
        if self.registry.remove(&mut self.map, key).is_some() {
            self.events.publish(MapEvent::LayerRemoved {
                key: key.to_string(),
                reason: RemovalReason::Toggled,
            });
            self.refresh_legend();
        }
    }

    fn refresh_legend(&mut self) {
        let entries = self.registry.snapshot();
        let items = self.legend.rebuild(&entries, &self.map).to_vec();
        self.events.publish(MapEvent::LegendRebuilt { items });
    }

    // =========================================================================
    // Search
    // =========================================================================

    fn set_search_provider(&mut self, provider: SearchProvider) {
        if !self.search.set_active(provider) {
            return;
        }
        self.pin.clear(&mut self.map);
        self.events.publish(MapEvent::MarkerCleared);
        self.publish_results();
    }

    fn search_input(&mut self, text: &str) {
        if self.search.active() != SearchProvider::LocationSearch {
            debug!("Location search input while inactive");
            return;
        }
        match self.search.on_location_input(text) {
            InputAction::HideResults => self.publish_results(),
            InputAction::Fetch { generation, query } => {
                let client = self.location.clone();
                let limit = self.search.settings().max_results;
                self.spawn(async move {
                    let result = client.search(&query, limit).await;
                    Message::LocationResults { generation, result }
                });
            }
        }
    }

    fn select_result(&mut self, index: usize) {
        let projection = self.map.view().projection;
        match self.search.select_result(index, projection) {
            Ok(position) => {
                self.publish_results();
                self.show_result(position);
            }
            Err(e) => debug!(error = %e, "Result selection ignored"),
        }
    }

    fn places_changed(&mut self, places: &[PlaceCandidate]) {
        if self.search.active() != SearchProvider::Places {
            debug!("Places selection while inactive");
            return;
        }
        match self.search.resolve_places(places, self.map.view().projection) {
            Ok(Some(position)) => self.show_result(position),
            Ok(None) => debug!("Place without a location"),
            Err(e) => warn!(error = %e, "Cannot show place"),
        }
    }

    /// Pin `position` and fly to it.
    fn show_result(&mut self, position: Coordinate) {
        self.pin
            .place(&mut self.map, position, &self.tx, |seq| Message::MarkerExpired { seq });
        self.map.animate(ViewAnimation {
            center: position,
            zoom: self.search.settings().result_zoom,
            duration: RESULT_ANIMATION,
        });
        self.events.publish(MapEvent::MarkerPlaced { position });
    }

    fn publish_results(&self) {
        self.events.publish(MapEvent::SearchResultsChanged {
            names: self.search.result_names(),
            visible: self.search.results_visible(),
        });
    }

    // =========================================================================
    // View and controls
    // =========================================================================

    fn map_click(&mut self, position: Coordinate) {
        let title = self.popup.click(&self.map, position).map(|c| c.title.clone());
        match title {
            Some(title) => self.events.publish(MapEvent::PopupShown { position, title }),
            None => self.events.publish(MapEvent::PopupHidden),
        }
    }

    fn control(&mut self, action: ControlAction) {
        match action {
            ControlAction::MyLocation => self.use_my_location(),
            ControlAction::Home => self.go_home(),
            ControlAction::AddLayer => self.events.publish(MapEvent::FileRequested),
            ControlAction::Print => self.print(),
            ControlAction::Basemap => {
                self.basemap_panel_open = !self.basemap_panel_open;
                debug!(open = self.basemap_panel_open, "Basemap panel toggled");
            }
        }
    }

    fn use_my_location(&mut self) {
        let Some(geolocator) = self.geolocator.clone() else {
            warn!("No geolocation capability");
            self.alert(UNSUPPORTED_MESSAGE);
            return;
        };
        let position = match geolocator.current_position() {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "Geolocation failed");
                self.alert(&e.to_string());
                return;
            }
        };
        let center = match coord::from_lon_lat(position, self.map.view().projection) {
            Ok(center) => center,
            Err(e) => {
                warn!(error = %e, "Position outside the map");
                self.alert(&e.to_string());
                return;
            }
        };

        self.map.set_marker(MarkerSlot::Location, Some(center));
        self.map.animate(ViewAnimation {
            center,
            zoom: LOCATION_ZOOM,
            duration: CONTROL_ANIMATION,
        });
        info!(%position, "Centred on device location");
    }

    fn go_home(&mut self) {
        match self.options.home_in(self.map.view().projection) {
            Ok(center) => {
                self.map.animate(ViewAnimation {
                    center,
                    zoom: self.options.home_zoom,
                    duration: CONTROL_ANIMATION,
                });
                self.map.set_marker(MarkerSlot::Location, None);
            }
            Err(e) => warn!(error = %e, "Home view not reachable"),
        }
    }

    fn print(&mut self) {
        let layers = self.basemap.current_layers();
        let prepared = print::ensure_output_dir(&self.options.print.output_dir).and_then(|()| {
            PrintJob::prepare(
                &self.map,
                &layers,
                &self.options.print,
                chrono::Utc::now().timestamp_millis(),
            )
        });
        match prepared {
            Ok(job) => self.spawn(async move {
                Message::PrintFinished {
                    result: print::export(job).await,
                }
            }),
            Err(e) => {
                error!(error = %e, "Print failed");
                self.alert(&format!("Print failed: {}", e));
            }
        }
    }
}

async fn save_download<C: AsyncHttpClient>(
    http: &C,
    url: &str,
    target: &Path,
) -> Result<(PathBuf, usize), FetchError> {
    let body = http.get(url).await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, &body).await?;
    Ok((target.to_path_buf(), body.len()))
}
