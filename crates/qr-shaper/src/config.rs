//! Immutable per-run configuration.
//!
//! Everything that varies between runs — canvas size, brand colors,
//! silhouette parameters, decoration layout — lives here, so batches
//! with different branding can execute concurrently without touching
//! shared state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use qr_symbol::EcLevel;
use silhouette::Curve;

use crate::plan::Strategy;
use crate::{Result, ShaperError};

/// Full configuration of a synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Error-correction level. Synthesis policy is `H`: every transform
    /// sacrifices module fidelity at the silhouette boundary and needs
    /// the 30% codeword redundancy to absorb it.
    pub ec_level: EcLevel,

    /// Output canvas side length in pixels.
    pub canvas_px: u32,

    /// Target side length of the rendered symbol (quiet zone included).
    /// Rounded down to a whole number of pixels per module.
    pub qr_px: u32,

    pub silhouette: SilhouetteSpec,

    /// Forced strategy; `None` auto-selects (Clip, then its widened
    /// fallback). PolarMorph is never auto-selected.
    pub strategy: Option<Strategy>,

    /// Containment clearance around protected regions, in modules.
    /// Values below 1 are raised to 1.
    pub margin_modules: u32,

    /// Width of the silhouette outline stroke, in pixels.
    pub border_px: f32,

    pub palette: Palette,

    pub decoration: Decoration,

    /// Hard ceiling on the validation decode, in milliseconds.
    pub decode_timeout_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::H,
            canvas_px: 1400,
            qr_px: 560,
            silhouette: SilhouetteSpec::default(),
            strategy: None,
            margin_modules: 2,
            border_px: 6.0,
            palette: Palette::default(),
            decoration: Decoration::default(),
            decode_timeout_ms: 5000,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the canvas side length.
    pub fn with_canvas_px(mut self, px: u32) -> Self {
        self.canvas_px = px;
        self
    }

    /// Builder: force a transform strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Builder: force a silhouette scale (disables auto-fit).
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.silhouette.scale = Some(scale);
        self.silhouette.auto_fit = false;
        self
    }

    /// Builder: set the decoration layer.
    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }
}

/// Silhouette placement parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SilhouetteSpec {
    pub curve: Curve,

    /// Fixed scale in pixels per curve unit. A forced scale still goes
    /// through the containment check and fails loudly when it would
    /// clip a finder.
    pub scale: Option<f32>,

    /// Search for the smallest scale that contains all protected
    /// regions (the default).
    pub auto_fit: bool,

    /// Pixel offset of the silhouette anchor from the canvas center.
    pub offset: (f32, f32),
}

impl Default for SilhouetteSpec {
    fn default() -> Self {
        Self {
            curve: Curve::Heart,
            scale: None,
            auto_fit: true,
            offset: (0.0, 0.0),
        }
    }
}

/// Per-run color scheme (RGB). No process-wide color constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Palette {
    pub dark: [u8; 3],
    pub light: [u8; 3],
    pub bg_top: [u8; 3],
    pub bg_bottom: [u8; 3],
    pub stroke: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        // Deep restaurant red on cream.
        Self {
            dark: [140, 29, 47],
            light: [255, 246, 236],
            bg_top: [255, 251, 245],
            bg_bottom: [250, 233, 228],
            stroke: [140, 29, 47],
        }
    }
}

/// Parse a CSS-style `#rrggbb` color.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3]> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 {
        return Err(ShaperError::InvalidColor(s.to_string()));
    }
    let bytes = hex::decode(digits).map_err(|_| ShaperError::InvalidColor(s.to_string()))?;
    Ok([bytes[0], bytes[1], bytes[2]])
}

/// Decorative layer: caption text and/or a logo image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Decoration {
    pub caption: Option<Caption>,
    pub logo: Option<Logo>,
}

/// A caption line drawn beneath the silhouette by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Caption {
    pub text: String,
    pub font_path: PathBuf,
    #[serde(default = "default_caption_px")]
    pub px: f32,
    /// Top-left corner of the caption box. `None` centers the caption
    /// in the bottom band of the canvas.
    #[serde(default)]
    pub origin: Option<(i32, i32)>,
}

fn default_caption_px() -> f32 {
    48.0
}

/// A logo image placed in the top-left corner by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Logo {
    pub path: PathBuf,
    #[serde(default = "default_logo_px")]
    pub px: u32,
    #[serde(default)]
    pub origin: Option<(i32, i32)>,
}

fn default_logo_px() -> u32 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_synthesis_policy() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.ec_level, EcLevel::H);
        assert_eq!(cfg.canvas_px, 1400);
        assert!(cfg.silhouette.auto_fit);
        assert!(cfg.strategy.is_none());
        assert!(cfg.margin_modules >= 1);
    }

    #[test]
    fn forced_scale_disables_auto_fit() {
        let cfg = RunConfig::new().with_scale(20.0);
        assert_eq!(cfg.silhouette.scale, Some(20.0));
        assert!(!cfg.silhouette.auto_fit);
    }

    #[test]
    fn hex_colors_parse_with_and_without_hash() {
        assert_eq!(parse_hex_color("#8c1d2f").unwrap(), [140, 29, 47]);
        assert_eq!(parse_hex_color("FFFFFF").unwrap(), [255, 255, 255]);
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("not-a-color").is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = RunConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.canvas_px, cfg.canvas_px);
        assert_eq!(back.palette.dark, cfg.palette.dark);
    }
}
