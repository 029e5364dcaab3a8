//! Closed parametric curves in normalized (unit) coordinates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SilhouetteError;

/// The classic heart parametrization spans roughly x in [-16, 16] and,
/// in image coordinates (y down), y in [-12.2, 17]: notch at the top,
/// tip at the bottom.
///
/// The ray-cast anchor sits below the notch (which bottoms out at
/// y = -5). The curve is star-shaped around this point; moving the
/// anchor above the notch breaks the single-radius-per-angle property
/// and silently mis-classifies boundary points, so it is fixed here
/// rather than configured per caller.
pub const HEART_ANCHOR: (f32, f32) = (0.0, 2.0);

/// A closed silhouette curve, evaluated in normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Curve {
    /// The pure heart curve.
    Heart,
    /// The heart with its top notch bridged by a chord across the lobe
    /// peaks, trading the notch for extra containment headroom.
    BridgedHeart,
}

impl Curve {
    /// Evaluate the curve at parameter `t` in [0, 2*pi), image
    /// coordinates (y grows downward).
    ///
    /// `BridgedHeart` shares the heart outline; its bridging is a
    /// radial construction applied by [`crate::RadialProfile::of`].
    pub fn point_at(&self, t: f32) -> (f32, f32) {
        let x = 16.0 * t.sin().powi(3);
        let y = -(13.0 * t.cos()
            - 5.0 * (2.0 * t).cos()
            - 2.0 * (3.0 * t).cos()
            - (4.0 * t).cos());
        (x, y)
    }

    /// The fixed interior anchor used for all angular/radial tests.
    pub fn anchor(&self) -> (f32, f32) {
        HEART_ANCHOR
    }

    /// Whether the radial profile should bridge the top notch.
    pub fn bridges_notch(&self) -> bool {
        matches!(self, Curve::BridgedHeart)
    }
}

impl FromStr for Curve {
    type Err = SilhouetteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart" => Ok(Curve::Heart),
            "bridged-heart" => Ok(Curve::BridgedHeart),
            other => Err(SilhouetteError::UnknownCurve(other.to_string())),
        }
    }
}

impl std::fmt::Display for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Curve::Heart => "heart",
            Curve::BridgedHeart => "bridged-heart",
        };
        f.write_str(s)
    }
}
