//! Legend synchronisation.
//!
//! The legend is derived state: it is rebuilt from a registry snapshot after
//! every add, remove or eviction. Visibility checkboxes act on the map layer
//! directly and never touch the registry.

use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::map::{LayerHandle, LayerSource, MapView};
use crate::registry::LayerEntry;
use crate::style::{Rgba, ACCENT};

/// Fallback swatch fill when the style has none.
pub const DEFAULT_SWATCH_FILL: Rgba = Rgba::rgba(255, 255, 255, 0.4);
/// Fallback swatch stroke when the style has none.
pub const DEFAULT_SWATCH_STROKE: Rgba = ACCENT;
pub const DEFAULT_SWATCH_STROKE_WIDTH: f32 = 1.25;

/// Symbol shown next to a legend label.
#[derive(Debug, Clone, PartialEq)]
pub enum Swatch {
    /// Colour box sampled from the layer's style function
    Vector {
        fill: Rgba,
        stroke: Rgba,
        stroke_width: f32,
    },
    /// Image served by the layer's WMS endpoint
    Image { url: String, alt: String },
    /// Layer has nothing to sample
    Empty,
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub key: String,
    pub layer: LayerHandle,
    pub label: String,
    pub checkbox_id: String,
    pub aria_label: String,
    /// Checkbox state, mirrors layer visibility
    pub visible: bool,
    pub swatch: Swatch,
}

#[derive(Debug, Default)]
pub struct LegendSynchronizer {
    items: Vec<LegendItem>,
    panel_open: bool,
}

impl LegendSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate every item from `entries`, in registry order.
    pub fn rebuild(&mut self, entries: &[LayerEntry], map: &dyn MapView) -> &[LegendItem] {
        self.items.clear();
        for entry in entries {
            let Some(layer) = map.layer(entry.layer) else {
                debug!(key = %entry.key, "Registry entry without map layer skipped");
                continue;
            };

            let file = file_name(&entry.key);
            let swatch = match &layer.source {
                LayerSource::Wms { url } => legend_graphic_url(url)
                    .map(|url| Swatch::Image {
                        url,
                        alt: format!("{} legend", file),
                    })
                    .unwrap_or(Swatch::Empty),
                LayerSource::Vector { features, style } => match features.first() {
                    Some(first) => vector_swatch(style(first)),
                    None => Swatch::Empty,
                },
                _ => Swatch::Empty,
            };

            self.items.push(LegendItem {
                key: entry.key.clone(),
                layer: entry.layer,
                label: display_label(&file),
                checkbox_id: format!("layer-{}", file),
                aria_label: format!("Toggle {} layer visibility", file),
                visible: layer.visible,
                swatch,
            });
        }
        debug!(items = self.items.len(), "Legend rebuilt");
        &self.items
    }

    /// Checkbox handler: show or hide the layer behind `key`.
    ///
    /// Returns false when no legend item has that key.
    pub fn set_visibility(&mut self, map: &mut dyn MapView, key: &str, visible: bool) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.key == key) else {
            return false;
        };
        if !map.set_visible(item.layer, visible) {
            return false;
        }
        item.visible = visible;
        true
    }

    pub fn items(&self) -> &[LegendItem] {
        &self.items
    }

    /// Flip the legend panel open/closed. Returns the new state.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        self.panel_open
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// `aria-expanded` value of the legend toggle.
    pub fn aria_expanded(&self) -> &'static str {
        if self.panel_open {
            "true"
        } else {
            "false"
        }
    }
}

/// Last path segment of a URL or file name, percent-decoded.
pub fn file_name(key: &str) -> String {
    let path = key.split(['?', '#']).next().unwrap_or(key);
    let segment = path
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path);
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Legend label: file name without its data extension.
pub fn display_label(file: &str) -> String {
    for ext in [".geojson", ".kml"] {
        let Some(stem_len) = file.len().checked_sub(ext.len()) else {
            continue;
        };
        if file.is_char_boundary(stem_len) && file[stem_len..].eq_ignore_ascii_case(ext) {
            return file[..stem_len].to_string();
        }
    }
    file.to_string()
}

/// Raster layers are recognised by a `wms` marker in their source URL.
pub fn is_wms(key: &str) -> bool {
    key.to_lowercase().contains("wms")
}

/// Build a GetLegendGraphic request for the WMS layer at `source`.
///
/// Returns `None` when `source` is not an absolute URL.
pub fn legend_graphic_url(source: &str) -> Option<String> {
    let mut url = url::Url::parse(source).ok()?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.into_owned())
    };
    let layer = param("LAYERS").or_else(|| param("LAYER")).unwrap_or_default();
    let style = param("STYLES").or_else(|| param("STYLE")).unwrap_or_default();

    // Override the request keys in place; vendor parameters stay.
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (name, value) in [
        ("SERVICE", "WMS"),
        ("VERSION", "1.3.0"),
        ("REQUEST", "GetLegendGraphic"),
        ("FORMAT", "image/png"),
        ("LAYER", layer.as_str()),
        ("STYLE", style.as_str()),
    ] {
        let mut found = false;
        pairs.retain_mut(|(k, v)| {
            if !k.eq_ignore_ascii_case(name) {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            *k = name.to_string();
            *v = value.to_string();
            true
        });
        if !found {
            pairs.push((name.to_string(), value.to_string()));
        }
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Some(url.into())
}

fn vector_swatch(style: crate::style::Style) -> Swatch {
    let circle = style.image;
    let fill = style
        .fill
        .or_else(|| circle.and_then(|c| c.fill))
        .map(|f| f.color)
        .unwrap_or(DEFAULT_SWATCH_FILL);
    let stroke = style.stroke.or_else(|| circle.and_then(|c| c.stroke));

    Swatch::Vector {
        fill,
        stroke: stroke.map(|s| s.color).unwrap_or(DEFAULT_SWATCH_STROKE),
        stroke_width: stroke.map(|s| s.width).unwrap_or(DEFAULT_SWATCH_STROKE_WIDTH),
    }
}
