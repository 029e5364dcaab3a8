//! The transform plan chosen for a run.

use serde::{Deserialize, Serialize};

use silhouette::Curve;

/// How the square symbol is fitted into the silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Discard modules outside the silhouette; QR geometry untouched.
    /// Relies on error-correction headroom to recover the clipped data.
    Clip,
    /// Clip against the widened-top curve when the pure silhouette
    /// cannot contain the protected regions at a canvas-friendly scale.
    EnlargedSafeClip,
    /// Remap every pixel between the square and the silhouette by
    /// angle/radius. Warps finder geometry; opt-in and experimental.
    PolarMorph,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Clip => "clip",
            Strategy::EnlargedSafeClip => "enlarged-safe-clip",
            Strategy::PolarMorph => "polar-morph",
        };
        f.write_str(s)
    }
}

/// The selected transform, immutable once chosen.
#[derive(Debug, Clone, Serialize)]
pub struct TransformPlan {
    pub strategy: Strategy,
    pub curve: Curve,
    /// Silhouette scale in pixels per curve unit.
    pub scale: f32,
    /// Pixel position of the silhouette anchor.
    pub center: (f32, f32),
    /// Outline stroke width in pixels.
    pub border_px: f32,
    /// Containment clearance used during selection, in modules.
    pub margin_modules: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_serializes_kebab_case() {
        let json = serde_json::to_string(&Strategy::EnlargedSafeClip).unwrap();
        assert_eq!(json, "\"enlarged-safe-clip\"");
        let back: Strategy = serde_json::from_str("\"polar-morph\"").unwrap();
        assert_eq!(back, Strategy::PolarMorph);
    }
}
