//! Basemap switching.
//!
//! Exactly one catalogue basemap is active. Its tile layers are attached to
//! the map as a single group below every overlay; switching replaces the
//! whole group and announces the change on the event bus.

mod catalog;

pub use catalog::{catalog, config_for, BasemapConfig, BasemapId, TileLayerConfig, UnknownBasemap};

use tracing::{debug, info};

use crate::events::{EventBus, MapEvent};
use crate::map::{LayerHandle, MapLayer, MapView};

/// z-index of the bottom basemap layer. Layer `i` of a basemap sits at
/// `BASEMAP_Z_INDEX_BASE + i`, always below overlays at zero.
pub const BASEMAP_Z_INDEX_BASE: i32 = -100;

/// Owns the active basemap group.
#[derive(Debug)]
pub struct BasemapSwitcher {
    current: BasemapId,
    group: Option<LayerHandle>,
}

impl BasemapSwitcher {
    pub fn new(initial: BasemapId) -> Self {
        Self {
            current: initial,
            group: None,
        }
    }

    /// Attach the initial basemap. Does nothing if already installed.
    pub fn install(&mut self, map: &mut dyn MapView) {
        if self.group.is_none() {
            self.group = Some(map.add_layer(build_group(&config_for(self.current))));
            info!(basemap = %self.current, "Basemap installed");
        }
    }

    /// Switch to `id`.
    ///
    /// Returns false, touching nothing, when `id` is already active.
    pub fn switch_to(&mut self, map: &mut dyn MapView, id: BasemapId, events: &EventBus) -> bool {
        if id == self.current && self.group.is_some() {
            debug!(basemap = %id, "Basemap already active");
            return false;
        }

        if let Some(old) = self.group.take() {
            map.remove_layer(old);
        }
        let config = config_for(id);
        self.group = Some(map.add_layer(build_group(&config)));
        self.current = id;

        info!(basemap = %id, "Basemap switched");
        events.publish(MapEvent::BasemapChanged {
            id,
            layers: config.layers,
        });
        true
    }

    /// String entry point. Unknown names are a silent no-op.
    pub fn switch_to_named(&mut self, map: &mut dyn MapView, name: &str, events: &EventBus) -> bool {
        match name.parse::<BasemapId>() {
            Ok(id) => self.switch_to(map, id, events),
            Err(e) => {
                debug!(error = %e, "Ignoring basemap switch");
                false
            }
        }
    }

    pub fn current_id(&self) -> BasemapId {
        self.current
    }

    pub fn current_layers(&self) -> Vec<TileLayerConfig> {
        config_for(self.current).layers
    }

    /// Handle of the attached group, if installed.
    pub fn group(&self) -> Option<LayerHandle> {
        self.group
    }
}

fn build_group(config: &BasemapConfig) -> MapLayer {
    let layers = config
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| MapLayer::xyz(l.url_template, l.attribution, BASEMAP_Z_INDEX_BASE + i as i32))
        .collect();
    MapLayer::group(layers, BASEMAP_Z_INDEX_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Coordinate, Projection};
    use crate::map::{LayerSource, MemoryMapView};

    fn setup() -> (MemoryMapView, BasemapSwitcher, EventBus) {
        let mut map = MemoryMapView::new(Coordinate::new(0.0, 0.0), 10.0, Projection::WebMercator);
        let mut switcher = BasemapSwitcher::new(BasemapId::Greyscale);
        switcher.install(&mut map);
        (map, switcher, EventBus::default())
    }

    #[test]
    fn test_install_attaches_group_below_overlays() {
        let (map, switcher, _) = setup();
        let group = map.layer(switcher.group().unwrap()).unwrap();
        assert!(group.z_index < 0);
        match &group.source {
            LayerSource::Group(layers) => assert_eq!(layers.len(), 1),
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_same_id_is_noop() {
        let (mut map, mut switcher, bus) = setup();
        let mut rx = bus.subscribe();
        let before = switcher.group();

        assert!(!switcher.switch_to(&mut map, BasemapId::Greyscale, &bus));
        assert_eq!(switcher.group(), before);
        assert_eq!(map.layer_count(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_switch_replaces_group_and_notifies() {
        let (mut map, mut switcher, bus) = setup();
        let mut rx = bus.subscribe();
        let old = switcher.group().unwrap();

        assert!(switcher.switch_to(&mut map, BasemapId::Topographic, &bus));
        assert!(!map.contains(old));
        assert_eq!(map.layer_count(), 1);
        assert_eq!(switcher.current_id(), BasemapId::Topographic);

        let group = map.layer(switcher.group().unwrap()).unwrap();
        match &group.source {
            LayerSource::Group(layers) => {
                let z: Vec<i32> = layers.iter().map(|l| l.z_index).collect();
                assert_eq!(z, vec![-100, -99]);
            }
            other => panic!("expected group, got {:?}", other),
        }

        match rx.try_recv().unwrap() {
            MapEvent::BasemapChanged { id, layers } => {
                assert_eq!(id, BasemapId::Topographic);
                assert_eq!(layers.len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_is_silent() {
        let (mut map, mut switcher, bus) = setup();
        let before = switcher.group();
        assert!(!switcher.switch_to_named(&mut map, "osm", &bus));
        assert_eq!(switcher.group(), before);
        assert_eq!(switcher.current_id(), BasemapId::Greyscale);
    }
}
