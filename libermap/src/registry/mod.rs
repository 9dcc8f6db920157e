//! Layer registry.
//!
//! Single source of truth for which overlay layers are displayed. Each entry
//! ties a key (source URL or local file name) to the map layer it created and,
//! for layers opened from the file tree, the toggle button that opened it.
//!
//! # Invariants
//!
//! - At most one entry per key.
//! - Every entry's layer is attached to the map, and every overlay the
//!   registry attached is still recorded. `add` and `remove` perform the map
//!   call themselves so the two cannot drift apart.
//!
//! # Capacity
//!
//! With a capacity of `n`, adding an entry beyond `n` evicts the oldest
//! entries by insertion order. There is no access-time tracking.

mod button;

pub use button::{ToggleButton, ToggleState};

use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use crate::map::{LayerHandle, MapLayer, MapView};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Key already registered; remove it first
    #[error("Layer '{0}' is already loaded")]
    AlreadyPresent(String),
}

/// One displayed overlay.
#[derive(Debug, Clone)]
pub struct LayerEntry {
    pub key: String,
    pub layer: LayerHandle,
    pub button: Option<ToggleButton>,
}

/// Insertion-ordered set of displayed overlays.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: VecDeque<LayerEntry>,
    capacity: Option<usize>,
}

impl LayerRegistry {
    /// Create a registry. `capacity` of `None` keeps every layer.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Attach `layer` to the map and record it under `key`.
    ///
    /// The button, if any, is switched to the removable state. Returns the
    /// entries evicted to respect the capacity, already detached and with
    /// their buttons reset.
    pub fn add(
        &mut self,
        map: &mut dyn MapView,
        key: &str,
        layer: MapLayer,
        button: Option<ToggleButton>,
    ) -> Result<Vec<LayerEntry>, RegistryError> {
        if self.has(key) {
            return Err(RegistryError::AlreadyPresent(key.to_string()));
        }

        let handle = map.add_layer(layer);
        if let Some(b) = &button {
            b.set_state(ToggleState::Remove);
        }
        self.entries.push_back(LayerEntry {
            key: key.to_string(),
            layer: handle,
            button,
        });
        info!(key = key, %handle, active = self.entries.len(), "Layer added");

        let mut evicted = Vec::new();
        if let Some(cap) = self.capacity {
            while self.entries.len() > cap {
                let Some(oldest) = self.entries.pop_front() else {
                    break;
                };
                detach(map, &oldest);
                debug!(key = %oldest.key, capacity = cap, "Layer evicted");
                evicted.push(oldest);
            }
        }
        Ok(evicted)
    }

    /// Detach and forget the layer registered under `key`.
    ///
    /// Unknown keys are a no-op.
    pub fn remove(&mut self, map: &mut dyn MapView, key: &str) -> Option<LayerEntry> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        let entry = self.entries.remove(index)?;
        detach(map, &entry);
        info!(key = key, active = self.entries.len(), "Layer removed");
        Some(entry)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&LayerEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter()
    }

    /// Owned copy of the entries, oldest first.
    pub fn snapshot(&self) -> Vec<LayerEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn detach(map: &mut dyn MapView, entry: &LayerEntry) {
    if map.remove_layer(entry.layer).is_none() {
        debug!(key = %entry.key, handle = %entry.layer, "Layer was already detached");
    }
    if let Some(b) = &entry.button {
        b.reset();
    }
}
