//! Sampled angle-to-radius lookup for a silhouette curve.

use std::f32::consts::{PI, TAU};

use tracing::debug;

use crate::curve::Curve;

/// Number of angle buckets in a profile.
const ANGLE_BUCKETS: usize = 1024;

/// Number of curve samples taken when building a profile.
const CURVE_SAMPLES: usize = 8192;

/// Boundary radius of a curve as a function of angle around its anchor.
///
/// Buckets keep the maximum radius observed, and unsampled buckets are
/// interpolated from their neighbors, so residual multi-crossings of a
/// not-quite-star-shaped region degrade by classifying points as
/// outside rather than inside.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    radii: Vec<f32>,
}

impl RadialProfile {
    /// Sample `curve` into a profile around its anchor.
    pub fn of(curve: &Curve) -> Self {
        let (ax, ay) = curve.anchor();
        let mut radii = vec![f32::NAN; ANGLE_BUCKETS];

        let mut y_top = f32::MAX;
        let mut x_at_top = 0.0f32;

        for i in 0..CURVE_SAMPLES {
            let t = i as f32 / CURVE_SAMPLES as f32 * TAU;
            let (px, py) = curve.point_at(t);
            let (dx, dy) = (px - ax, py - ay);
            let r = dx.hypot(dy);
            let bucket = bucket_of(dy.atan2(dx));
            if radii[bucket].is_nan() || r > radii[bucket] {
                radii[bucket] = r;
            }
            // Track the lobe peak (topmost point) for notch bridging.
            if py < y_top {
                y_top = py;
                x_at_top = px.abs();
            }
        }

        interpolate_gaps(&mut radii);

        if curve.bridges_notch() {
            bridge_notch(&mut radii, ay - y_top, x_at_top);
        }

        debug!(
            curve = %curve,
            buckets = ANGLE_BUCKETS,
            samples = CURVE_SAMPLES,
            "Built radial profile"
        );
        Self { radii }
    }

    /// Boundary radius (in curve units) at `angle` radians.
    pub fn radius_at(&self, angle: f32) -> f32 {
        let pos = (angle.rem_euclid(TAU)) / TAU * ANGLE_BUCKETS as f32;
        let i = pos.floor() as usize % ANGLE_BUCKETS;
        let j = (i + 1) % ANGLE_BUCKETS;
        let frac = pos - pos.floor();
        self.radii[i] * (1.0 - frac) + self.radii[j] * frac
    }

    /// Largest boundary radius over all angles.
    pub fn max_radius(&self) -> f32 {
        self.radii.iter().copied().fold(0.0, f32::max)
    }

    /// Iterate (angle, radius) pairs over all buckets.
    pub fn directions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.radii
            .iter()
            .enumerate()
            .map(|(i, &r)| (i as f32 / ANGLE_BUCKETS as f32 * TAU, r))
    }
}

fn bucket_of(angle: f32) -> usize {
    let pos = angle.rem_euclid(TAU) / TAU * ANGLE_BUCKETS as f32;
    (pos.floor() as usize).min(ANGLE_BUCKETS - 1)
}

/// Fill unsampled buckets by circular linear interpolation.
fn interpolate_gaps(radii: &mut [f32]) {
    let n = radii.len();
    let filled: Vec<usize> = (0..n).filter(|&i| !radii[i].is_nan()).collect();
    if filled.is_empty() || filled.len() == n {
        return;
    }
    for w in 0..filled.len() {
        let a = filled[w];
        let b = filled[(w + 1) % filled.len()];
        let span = if b > a { b - a } else { b + n - a };
        for step in 1..span {
            let idx = (a + step) % n;
            let frac = step as f32 / span as f32;
            radii[idx] = radii[a] * (1.0 - frac) + radii[b] * frac;
        }
    }
}

/// Replace the notch sector with the chord across the two lobe peaks.
///
/// `depth` is the vertical distance from the anchor up to the lobe
/// peaks, `half_width` the horizontal distance from the axis to a peak.
/// Only rays that meet the chord between the peaks are widened.
fn bridge_notch(radii: &mut [f32], depth: f32, half_width: f32) {
    let n = radii.len();
    for i in 0..n {
        let angle = i as f32 / n as f32 * TAU;
        let (dx, dy) = (angle.cos(), angle.sin());
        // Up is -y in image coordinates.
        let cos_up = -dy;
        if cos_up <= 0.0 {
            continue;
        }
        let off_axis = angle_from_vertical(dx, cos_up);
        if depth * off_axis.tan() > half_width {
            continue;
        }
        let chord_radius = depth / cos_up;
        if chord_radius > radii[i] {
            radii[i] = chord_radius;
        }
    }
}

fn angle_from_vertical(dx: f32, cos_up: f32) -> f32 {
    dx.abs().atan2(cos_up).min(PI / 2.0 - 1e-3)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: f32 = -PI / 2.0;

    #[test]
    fn every_bucket_has_a_positive_radius() {
        let p = RadialProfile::of(&Curve::Heart);
        for (_, r) in p.directions() {
            assert!(r.is_finite() && r > 0.0);
        }
    }

    #[test]
    fn radius_is_symmetric_left_right() {
        let p = RadialProfile::of(&Curve::Heart);
        for i in 0..32 {
            let a = i as f32 / 32.0 * PI - PI / 2.0;
            let mirrored = PI - a;
            let (ra, rb) = (p.radius_at(a), p.radius_at(mirrored));
            assert!(
                (ra - rb).abs() < 0.35,
                "asymmetry at angle {a}: {ra} vs {rb}"
            );
        }
    }

    #[test]
    fn notch_is_the_nearest_upward_boundary() {
        let p = RadialProfile::of(&Curve::Heart);
        // Straight up from the anchor (0, 2) the notch is 7 units away.
        let straight_up = p.radius_at(UP);
        assert!((straight_up - 7.0).abs() < 0.5, "got {straight_up}");
        // The lobes reach farther than the notch.
        let toward_lobe = p.radius_at(UP + 0.45);
        assert!(toward_lobe > straight_up);
    }

    #[test]
    fn bridged_profile_dominates_the_heart() {
        let heart = RadialProfile::of(&Curve::Heart);
        let bridged = RadialProfile::of(&Curve::BridgedHeart);
        for (i, (angle, r)) in bridged.directions().enumerate() {
            let base = heart.radius_at(angle);
            assert!(
                r >= base - 1e-3,
                "bucket {i}: bridged {r} fell below heart {base}"
            );
        }
    }

    #[test]
    fn bridging_lifts_the_notch_to_lobe_height() {
        let heart = RadialProfile::of(&Curve::Heart);
        let bridged = RadialProfile::of(&Curve::BridgedHeart);
        let lifted = bridged.radius_at(UP);
        assert!(lifted > heart.radius_at(UP) + 4.0, "got {lifted}");
        // The sides are untouched.
        let side = 0.0;
        assert!((bridged.radius_at(side) - heart.radius_at(side)).abs() < 1e-3);
    }

    #[test]
    fn max_radius_matches_the_side_reach() {
        let p = RadialProfile::of(&Curve::Heart);
        // Farthest boundary from the anchor is the widest point of a
        // lobe, about 17 units away.
        let max = p.max_radius();
        assert!(max > 15.0 && max < 18.0, "got {max}");
    }
}
