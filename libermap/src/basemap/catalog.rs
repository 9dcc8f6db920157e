//! Built-in basemap catalogue.

use std::fmt;
use std::str::FromStr;

const LANDSD_ATTRIBUTION: &str = "Lands Department © The Government of the Hong Kong SAR";
const LANDSD_LABELS: &str =
    "https://mapapi.geodata.gov.hk/gs/api/v1.0.0/xyz/label/hk/en/wgs84/{z}/{x}/{y}.png";

/// Identifier of a catalogue basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasemapId {
    Topographic,
    Imagery,
    Greyscale,
}

impl BasemapId {
    pub const ALL: [BasemapId; 3] = [BasemapId::Topographic, BasemapId::Imagery, BasemapId::Greyscale];

    pub fn as_str(&self) -> &'static str {
        match self {
            BasemapId::Topographic => "topographic",
            BasemapId::Imagery => "imagery",
            BasemapId::Greyscale => "greyscale",
        }
    }
}

impl fmt::Display for BasemapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown basemap identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown basemap '{0}' (expected topographic, imagery or greyscale)")]
pub struct UnknownBasemap(pub String);

impl FromStr for BasemapId {
    type Err = UnknownBasemap;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "topographic" => Ok(BasemapId::Topographic),
            "imagery" => Ok(BasemapId::Imagery),
            "greyscale" | "grayscale" => Ok(BasemapId::Greyscale),
            _ => Err(UnknownBasemap(s.to_string())),
        }
    }
}

/// One tile layer of a basemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerConfig {
    pub url_template: &'static str,
    pub attribution: &'static str,
}

impl TileLayerConfig {
    /// Template with subdomain and retina placeholders resolved, suitable
    /// for a plain `{z}/{x}/{y}` tile fetcher.
    pub fn concrete_template(&self) -> String {
        self.url_template.replace("{a-c}", "a").replace("{r}", "")
    }
}

/// Immutable catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasemapConfig {
    pub id: BasemapId,
    pub display_name: &'static str,
    pub thumbnail: &'static str,
    /// Bottom-most first
    pub layers: Vec<TileLayerConfig>,
}

/// Catalogue entry for `id`.
pub fn config_for(id: BasemapId) -> BasemapConfig {
    match id {
        BasemapId::Topographic => BasemapConfig {
            id,
            display_name: "Topographic",
            thumbnail: "img/topographic.png",
            layers: vec![
                TileLayerConfig {
                    url_template:
                        "https://mapapi.geodata.gov.hk/gs/api/v1.0.0/xyz/basemap/wgs84/{z}/{x}/{y}.png",
                    attribution: LANDSD_ATTRIBUTION,
                },
                TileLayerConfig {
                    url_template: LANDSD_LABELS,
                    attribution: LANDSD_ATTRIBUTION,
                },
            ],
        },
        BasemapId::Imagery => BasemapConfig {
            id,
            display_name: "Imagery",
            thumbnail: "img/imagery.png",
            layers: vec![
                TileLayerConfig {
                    url_template:
                        "https://mapapi.geodata.gov.hk/gs/api/v1.0.0/xyz/imagery/wgs84/{z}/{x}/{y}.png",
                    attribution: LANDSD_ATTRIBUTION,
                },
                TileLayerConfig {
                    url_template: LANDSD_LABELS,
                    attribution: LANDSD_ATTRIBUTION,
                },
            ],
        },
        BasemapId::Greyscale => BasemapConfig {
            id,
            display_name: "Carto Light (Grayscale)",
            thumbnail: "img/carto-light.png",
            layers: vec![TileLayerConfig {
                url_template: "https://{a-c}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
                attribution: "© OpenStreetMap contributors, © CARTO",
            }],
        },
    }
}

/// The full catalogue in menu order.
pub fn catalog() -> Vec<BasemapConfig> {
    BasemapId::ALL.iter().map(|id| config_for(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_names() {
        for id in BasemapId::ALL {
            assert_eq!(id.as_str().parse::<BasemapId>().unwrap(), id);
        }
        assert_eq!("GrayScale".parse::<BasemapId>().unwrap(), BasemapId::Greyscale);
        assert!("satellite".parse::<BasemapId>().is_err());
    }

    #[test]
    fn test_government_basemaps_have_label_layer() {
        for id in [BasemapId::Topographic, BasemapId::Imagery] {
            let cfg = config_for(id);
            assert_eq!(cfg.layers.len(), 2);
            assert_eq!(cfg.layers[1].url_template, LANDSD_LABELS);
        }
        assert_eq!(config_for(BasemapId::Greyscale).layers.len(), 1);
    }

    #[test]
    fn test_concrete_template() {
        let carto = &config_for(BasemapId::Greyscale).layers[0];
        assert_eq!(
            carto.concrete_template(),
            "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png"
        );
    }
}
