//! Angle/radius remapping between the square symbol and the silhouette.

use silhouette::RadialProfile;

/// Bidirectional polar mapping used by the morph strategy.
///
/// A point at fraction `f` of the way from the symbol center to the
/// square's edge (along some angle) maps to the point at fraction `f`
/// of the way from the silhouette anchor to its boundary at the same
/// angle, and back.
#[derive(Debug, Clone)]
pub struct PolarMap<'a> {
    profile: &'a RadialProfile,
    sil_center: (f32, f32),
    scale: f32,
    qr_center: (f32, f32),
    qr_half: f32,
}

impl<'a> PolarMap<'a> {
    pub fn new(
        profile: &'a RadialProfile,
        sil_center: (f32, f32),
        scale: f32,
        qr_center: (f32, f32),
        qr_half: f32,
    ) -> Self {
        Self {
            profile,
            sil_center,
            scale,
            qr_center,
            qr_half,
        }
    }

    /// Distance from the symbol center to the square's edge at `angle`.
    fn square_radius(&self, angle: f32) -> f32 {
        self.qr_half / angle.cos().abs().max(angle.sin().abs())
    }

    /// Map an output (silhouette) pixel back to its source pixel in
    /// the square symbol.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let dx = x - self.sil_center.0;
        let dy = y - self.sil_center.1;
        let r = dx.hypot(dy);
        if r == 0.0 {
            return self.qr_center;
        }
        let angle = dy.atan2(dx);
        let boundary = self.profile.radius_at(angle) * self.scale;
        let fraction = (r / boundary).min(1.0);
        let source_r = fraction * self.square_radius(angle);
        (
            self.qr_center.0 + dx / r * source_r,
            self.qr_center.1 + dy / r * source_r,
        )
    }

    /// Map a source pixel in the square symbol to where it lands in
    /// the silhouette.
    pub fn to_output(&self, x: f32, y: f32) -> (f32, f32) {
        let dx = x - self.qr_center.0;
        let dy = y - self.qr_center.1;
        let r = dx.hypot(dy);
        if r == 0.0 {
            return self.sil_center;
        }
        let angle = dy.atan2(dx);
        let fraction = (r / self.square_radius(angle)).min(1.0);
        let out_r = fraction * self.profile.radius_at(angle) * self.scale;
        (
            self.sil_center.0 + dx / r * out_r,
            self.sil_center.1 + dy / r * out_r,
        )
    }
}
