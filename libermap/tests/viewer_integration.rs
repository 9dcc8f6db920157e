//! Integration tests for the viewer.
//!
//! These tests drive a [`Viewer`] over a headless map and a canned HTTP
//! client, covering:
//! - Registry, map and legend staying in step
//! - Layer capacity and eviction
//! - Basemap switching
//! - Search provider switching and stale result handling
//! - Search pin lifetime
//! - Lazy folder listing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use libermap::basemap::BasemapId;
use libermap::coord::{self, Coordinate, Projection};
use libermap::events::{MapEvent, RemovalReason};
use libermap::fetch::{AsyncHttpClient, FetchError, DEFAULT_CONTENTS_URL, DEFAULT_LOCATION_SEARCH_URL};
use libermap::map::{MapView, MarkerSlot, MemoryMapView};
use libermap::search::SearchProvider;
use libermap::viewer::{Command, Viewer, ViewerOptions};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Test Helpers
// =============================================================================

/// HTTP client answering from a fixed URL table.
#[derive(Clone, Default)]
struct CannedHttp {
    bodies: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedHttp {
    fn with(self, url: &str, body: &str) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    fn requests_to(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl AsyncHttpClient for CannedHttp {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.lock().unwrap().get(url) {
            Some(body) => Ok(body.clone().into_bytes()),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    async fn get_with_headers(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        self.get(url).await
    }
}

const CONSERVATION: &str = "Data_GML/保育%20Conservation";

fn search_url(query: &str) -> String {
    format!("{}?q={}", DEFAULT_LOCATION_SEARCH_URL, query)
}

fn point_kml(name: &str, lon: f64, lat: f64) -> String {
    format!(
        "<kml><Placemark><name>{}</name><Point><coordinates>{},{}</coordinates></Point></Placemark></kml>",
        name, lon, lat
    )
}

fn viewer_with(http: CannedHttp, options: ViewerOptions) -> Viewer<CannedHttp, MemoryMapView> {
    let center = options.home_in(Projection::WebMercator).unwrap();
    let map = MemoryMapView::new(center, options.home_zoom, Projection::WebMercator);
    Viewer::new(map, http, options)
}

fn viewer(http: CannedHttp) -> Viewer<CannedHttp, MemoryMapView> {
    viewer_with(http, ViewerOptions::default())
}

fn wms(n: usize) -> String {
    format!("https://mapservices.example/wms?LAYERS=layer{}", n)
}

/// Overlays on the map, excluding the basemap group.
fn overlay_count(viewer: &Viewer<CannedHttp, MemoryMapView>) -> usize {
    viewer.map().layer_count() - 1
}

// =============================================================================
// Layers
// =============================================================================

#[tokio::test]
async fn test_registry_map_and_legend_in_step() {
    let urls: Vec<String> = (0..3)
        .map(|i| format!("https://raw.example/layer{}.kml", i))
        .collect();
    let mut http = CannedHttp::default();
    for (i, url) in urls.iter().enumerate() {
        http = http.with(url, &point_kml("p", 114.1 + i as f64 * 0.01, 22.3));
    }
    let mut viewer = viewer(http);

    for url in &urls {
        viewer.dispatch(Command::ToggleUrl { url: url.clone() });
    }
    viewer.settle().await;
    assert_eq!(viewer.registry().len(), 3);
    assert_eq!(overlay_count(&viewer), 3);
    assert_eq!(viewer.legend().items().len(), 3);

    viewer.dispatch(Command::ToggleUrl { url: urls[1].clone() });
    assert_eq!(viewer.registry().len(), 2);
    assert_eq!(overlay_count(&viewer), 2);
    let labels: Vec<&str> = viewer
        .legend()
        .items()
        .iter()
        .map(|i| i.label.as_str())
        .collect();
    assert!(!labels.contains(&"layer1"));
    assert_eq!(labels.len(), 2);

    for entry in viewer.registry().entries() {
        assert!(viewer.map().contains(entry.layer));
    }
}

#[tokio::test]
async fn test_capacity_evicts_oldest() {
    let mut viewer = viewer(CannedHttp::default());
    let mut events = viewer.subscribe();

    for n in 0..6 {
        viewer.dispatch(Command::ToggleUrl { url: wms(n) });
    }

    assert_eq!(viewer.registry().len(), 5);
    assert!(!viewer.registry().has(&wms(0)));
    assert!(viewer.registry().has(&wms(5)));
    assert_eq!(overlay_count(&viewer), 5);
    assert_eq!(viewer.legend().items().len(), 5);

    let mut evicted = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let MapEvent::LayerRemoved {
            key,
            reason: RemovalReason::Evicted,
        } = event
        {
            evicted.push(key);
        }
    }
    assert_eq!(evicted, vec![wms(0)]);
}

#[tokio::test]
async fn test_unbounded_capacity_keeps_everything() {
    let options = ViewerOptions {
        layer_capacity: None,
        ..ViewerOptions::default()
    };
    let mut viewer = viewer_with(CannedHttp::default(), options);

    for n in 0..8 {
        viewer.dispatch(Command::ToggleUrl { url: wms(n) });
    }
    assert_eq!(viewer.registry().len(), 8);
}

// =============================================================================
// Basemap
// =============================================================================

#[tokio::test]
async fn test_switching_to_active_basemap_is_noop() {
    let mut viewer = viewer(CannedHttp::default());
    let mut events = viewer.subscribe();
    let group = viewer.basemap().group();

    viewer.dispatch(Command::SwitchBasemap {
        name: "greyscale".into(),
    });
    assert_eq!(viewer.basemap().group(), group);
    assert!(events.try_recv().is_err());

    viewer.dispatch(Command::SwitchBasemap {
        name: "topographic".into(),
    });
    assert_eq!(viewer.basemap().current_id(), BasemapId::Topographic);
    assert_eq!(viewer.map().layer_count(), 1);
    assert_eq!(events.try_recv().unwrap().event_type(), "basemap_changed");
}

// =============================================================================
// Search
// =============================================================================

const CENTRAL: &str = r#"[
    {"nameZH": "中環", "nameEN": "Central", "x": 835000, "y": 816000},
    {"nameZH": "中環碼頭", "x": 834000, "y": 816700}
]"#;

const CENTRE: &str = r#"[{"nameZH": "中心", "x": 836000, "y": 818000}]"#;

fn location_viewer(http: CannedHttp) -> Viewer<CannedHttp, MemoryMapView> {
    let options = ViewerOptions {
        search_provider: SearchProvider::LocationSearch,
        ..ViewerOptions::default()
    };
    viewer_with(http, options)
}

#[tokio::test]
async fn test_selecting_result_pins_and_flies_to_it() {
    let http = CannedHttp::default().with(&search_url("central"), CENTRAL);
    let mut viewer = location_viewer(http);

    viewer.dispatch(Command::SearchInput {
        text: "central".into(),
    });
    viewer.settle().await;
    assert!(viewer.search().results_visible());
    assert_eq!(viewer.search().results().len(), 2);

    viewer.dispatch(Command::SelectResult { index: 0 });
    assert!(!viewer.search().results_visible());

    let pin = viewer.map().marker(MarkerSlot::Search).unwrap();
    let lon_lat = coord::to_lon_lat(pin, Projection::WebMercator).unwrap();
    assert!((lon_lat.x - 114.16456).abs() < 1e-3, "lon was {}", lon_lat.x);
    assert!((lon_lat.y - 22.28288).abs() < 1e-3, "lat was {}", lon_lat.y);

    let animation = viewer.map().last_animation().unwrap();
    assert_eq!(animation.center, pin);
    assert_eq!(animation.duration, Duration::from_millis(1000));
}

const CENTRAL_MANY: &str = r#"[
    {"nameZH": "中環", "x": 835000, "y": 816000},
    {"nameZH": "中環碼頭", "x": 834000, "y": 816700},
    {"nameZH": "中環街市", "x": 834700, "y": 816300},
    {"nameZH": "中環廣場", "x": 836200, "y": 815900},
    {"nameZH": "中環中心", "x": 834900, "y": 816200},
    {"nameZH": "中環站", "x": 835100, "y": 816100},
    {"nameZH": "中環大廈", "x": 835200, "y": 816050}
]"#;

#[tokio::test]
async fn test_selecting_third_of_five_results_sets_input_text() {
    let http = CannedHttp::default().with(&search_url("central"), CENTRAL_MANY);
    let mut viewer = location_viewer(http);

    viewer.dispatch(Command::SearchInput {
        text: "central".into(),
    });
    viewer.settle().await;
    assert_eq!(viewer.search().results().len(), 5);

    viewer.dispatch(Command::SelectResult { index: 2 });
    assert_eq!(viewer.search().input_text(), "中環街市");
    assert!(!viewer.search().results_visible());

    let expected = coord::transform(
        Coordinate::new(834700.0, 816300.0),
        Projection::Hk1980Grid,
        Projection::WebMercator,
    )
    .unwrap();
    let pin = viewer.map().marker(MarkerSlot::Search).unwrap();
    assert!((pin.x - expected.x).abs() < 1e-6 && (pin.y - expected.y).abs() < 1e-6);
    assert_eq!(viewer.map().last_animation().unwrap().center, pin);
}

#[tokio::test]
async fn test_stale_results_discarded() {
    let http = CannedHttp::default()
        .with(&search_url("cen"), CENTRE)
        .with(&search_url("central"), CENTRAL);
    let mut viewer = location_viewer(http);

    viewer.dispatch(Command::SearchInput { text: "cen".into() });
    viewer.dispatch(Command::SearchInput {
        text: "central".into(),
    });
    viewer.settle().await;

    assert_eq!(
        viewer.search().result_names(),
        vec!["中環".to_string(), "中環碼頭".to_string()]
    );
}

#[tokio::test]
async fn test_short_query_hides_results_without_request() {
    let http = CannedHttp::default();
    let mut viewer = location_viewer(http.clone());

    viewer.dispatch(Command::SearchInput { text: "c".into() });
    assert!(!viewer.has_pending_work());
    assert!(!viewer.search().results_visible());
    assert_eq!(http.requests_to(&search_url("c")), 0);
}

#[tokio::test]
async fn test_provider_switch_clears_state() {
    let http = CannedHttp::default().with(&search_url("central"), CENTRAL);
    let mut viewer = location_viewer(http);

    viewer.dispatch(Command::SearchInput {
        text: "central".into(),
    });
    viewer.settle().await;
    viewer.dispatch(Command::SelectResult { index: 0 });
    assert!(viewer.pin().is_timer_pending());

    viewer.dispatch(Command::SetSearchProvider(SearchProvider::Places));

    assert!(viewer.search().is_input_visible(SearchProvider::Places));
    assert!(!viewer.search().is_input_visible(SearchProvider::LocationSearch));
    assert!(viewer.search().results().is_empty());
    assert!(!viewer.pin().is_timer_pending());
    assert_eq!(viewer.map().marker(MarkerSlot::Search), None);
}

#[tokio::test(start_paused = true)]
async fn test_pin_removed_after_timeout() {
    let http = CannedHttp::default().with(&search_url("central"), CENTRAL);
    let mut viewer = location_viewer(http);

    viewer.dispatch(Command::SearchInput {
        text: "central".into(),
    });
    viewer.settle().await;
    viewer.dispatch(Command::SelectResult { index: 0 });
    assert!(viewer.map().marker(MarkerSlot::Search).is_some());

    let (_commands, rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let stopper = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(6)).await;
        stopper.cancel();
    });
    viewer.run(rx, shutdown).await;

    assert_eq!(viewer.map().marker(MarkerSlot::Search), None);
    assert!(!viewer.pin().is_timer_pending());
}

// =============================================================================
// File tree
// =============================================================================

#[tokio::test]
async fn test_folder_listed_once() {
    let listing_url = format!("{}{}", DEFAULT_CONTENTS_URL, CONSERVATION);
    let listing = format!(
        r#"[{{"name": "Wetlands.kml", "path": "{0}/Wetlands.kml", "type": "file",
             "download_url": "https://raw.example/Wetlands.kml"}}]"#,
        CONSERVATION
    );
    let http = CannedHttp::default().with(&listing_url, &listing);
    let mut viewer = viewer(http.clone());

    for _ in 0..3 {
        viewer.dispatch(Command::ToggleFolder {
            path: CONSERVATION.into(),
        });
        viewer.settle().await;
    }

    assert_eq!(http.requests_to(&listing_url), 1);
    let folder = viewer.file_tree().find_by_path(CONSERVATION).unwrap();
    assert!(viewer.file_tree().node(folder).unwrap().expanded);
    assert_eq!(viewer.file_tree().children(folder).len(), 1);
}

#[tokio::test]
async fn test_home_control_returns_to_home_view() {
    let mut viewer = viewer(CannedHttp::default());
    viewer.dispatch(Command::Control(libermap::controls::ControlAction::Home));

    let expected = coord::from_lon_lat(
        Coordinate::lon_lat(114.1095, 22.3964),
        Projection::WebMercator,
    )
    .unwrap();
    let view = viewer.map().view();
    assert!(view.center.distance_to(&expected) < 1e-6);
    assert_eq!(view.zoom, 10.3);
}
