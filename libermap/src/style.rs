//! Feature symbology.
//!
//! Styles are computed per feature by a [`StyleFunction`]. The legend samples
//! the same function to draw its swatches, so the two always agree.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::kml::{Feature, Geometry};

/// Primary accent colour used for overlays (`#3399CC`).
pub const ACCENT: Rgba = Rgba::rgb(51, 153, 204);

/// Failed to parse a CSS colour string.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid colour '{0}'")]
pub struct ColorParseError(pub String);

/// An sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with a different opacity.
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let trimmed = s.trim();

        if let Some(hex) = trimmed.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(err());
            }
            let expanded: String = match hex.len() {
                3 => hex.chars().flat_map(|c| [c, c]).collect(),
                6 => hex.to_string(),
                _ => return Err(err()),
            };
            let channel =
                |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| err());
            return Ok(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        let (body, has_alpha) = if let Some(rest) = trimmed.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = trimmed.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(err());
        };
        let body = body.strip_suffix(')').ok_or_else(err)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();

        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(err());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| err());
        let alpha = if has_alpha {
            parts[3].parse::<f32>().map_err(|_| err())?
        } else {
            1.0
        };

        Ok(Rgba::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha.clamp(0.0, 1.0),
        ))
    }
}

/// Parse `color` and replace its opacity.
pub fn to_rgba(color: &str, opacity: f32) -> Result<Rgba, ColorParseError> {
    Ok(color.parse::<Rgba>()?.with_alpha(opacity))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

/// Circle marker used to render point features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleStyle {
    pub radius: f32,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

/// Resolved style for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub image: Option<CircleStyle>,
}

/// Per-feature style callback attached to vector layers.
pub type StyleFunction = fn(&Feature) -> Style;

/// Default overlay symbology.
///
/// Points get a 7px accent circle with a white 2px outline; lines and
/// polygons get a 70% accent fill with a 2px accent outline.
pub fn default_style(feature: &Feature) -> Style {
    match &feature.geometry {
        Some(g) if g.is_point_like() => Style {
            fill: None,
            stroke: None,
            image: Some(CircleStyle {
                radius: 7.0,
                fill: Some(Fill { color: ACCENT }),
                stroke: Some(Stroke {
                    color: Rgba::rgb(255, 255, 255),
                    width: 2.0,
                }),
            }),
        },
        _ => Style {
            fill: Some(Fill {
                color: ACCENT.with_alpha(0.7),
            }),
            stroke: Some(Stroke {
                color: ACCENT,
                width: 2.0,
            }),
            image: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    fn feature(geometry: Geometry) -> Feature {
        Feature {
            name: None,
            description: None,
            properties: Vec::new(),
            geometry: Some(geometry),
        }
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!("#3399CC".parse::<Rgba>().unwrap(), ACCENT);
        assert_eq!("#fff".parse::<Rgba>().unwrap(), Rgba::rgb(255, 255, 255));
        assert!("#12345".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_parse_functional() {
        assert_eq!(
            "rgba(255, 255, 255, 0.4)".parse::<Rgba>().unwrap(),
            Rgba::rgba(255, 255, 255, 0.4)
        );
        assert_eq!("rgb(1,2,3)".parse::<Rgba>().unwrap(), Rgba::rgb(1, 2, 3));
        assert!("rgb(1,2)".parse::<Rgba>().is_err());
        assert!("hsl(0, 0%, 0%)".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_display_matches_css() {
        assert_eq!(ACCENT.with_alpha(0.7).to_string(), "rgba(51, 153, 204, 0.7)");
    }

    #[test]
    fn test_to_rgba_overrides_opacity() {
        let c = to_rgba("#3399CC", 0.5).unwrap();
        assert_eq!(c.a, 0.5);
        assert_eq!((c.r, c.g, c.b), (51, 153, 204));
    }

    #[test]
    fn test_default_style_point() {
        let style = default_style(&feature(Geometry::Point(Coordinate::new(0.0, 0.0))));
        let circle = style.image.unwrap();
        assert_eq!(circle.radius, 7.0);
        assert_eq!(circle.fill.unwrap().color, ACCENT);
        assert!(style.fill.is_none());
    }

    #[test]
    fn test_default_style_polygon() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let style = default_style(&feature(Geometry::Polygon(vec![ring])));
        assert_eq!(style.fill.unwrap().color.a, 0.7);
        assert_eq!(style.stroke.unwrap().width, 2.0);
        assert!(style.image.is_none());
    }
}
