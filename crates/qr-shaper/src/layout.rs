//! Module-to-pixel layout of the rendered symbol.

use qr_symbol::{ModuleRect, SymbolMatrix};
use silhouette::PixelBox;

/// Where the symbol sits on the canvas and how large its modules are.
///
/// The symbol (quiet zone included) is centered on the silhouette
/// anchor and drawn at a whole number of pixels per module so clip
/// strategies can render modules 1:1 without resampling.
#[derive(Debug, Clone, Copy)]
pub struct SymbolLayout {
    origin: (f32, f32),
    module_px: u32,
    data_modules: u32,
    quiet_zone: u32,
}

impl SymbolLayout {
    /// Lay out `matrix` so the symbol spans about `qr_px` pixels,
    /// centered at `center`.
    pub fn new(matrix: &SymbolMatrix, qr_px: u32, center: (f32, f32)) -> Self {
        let data_modules = matrix.side();
        let quiet_zone = matrix.quiet_zone_modules();
        let total = data_modules + 2 * quiet_zone;
        let module_px = (qr_px / total).max(1);
        let total_px = (total * module_px) as f32;
        Self {
            origin: (center.0 - total_px / 2.0, center.1 - total_px / 2.0),
            module_px,
            data_modules,
            quiet_zone,
        }
    }

    pub fn module_px(&self) -> u32 {
        self.module_px
    }

    pub fn quiet_zone(&self) -> u32 {
        self.quiet_zone
    }

    /// Total side length in modules, quiet zone included.
    pub fn total_modules(&self) -> u32 {
        self.data_modules + 2 * self.quiet_zone
    }

    /// Total side length in pixels, quiet zone included.
    pub fn total_px(&self) -> f32 {
        (self.total_modules() * self.module_px) as f32
    }

    /// Center of the symbol on the canvas.
    pub fn qr_center(&self) -> (f32, f32) {
        (
            self.origin.0 + self.total_px() / 2.0,
            self.origin.1 + self.total_px() / 2.0,
        )
    }

    /// Pixel box of a rectangle given in data-module coordinates.
    pub fn module_box(&self, rect: &ModuleRect) -> PixelBox {
        let m = self.module_px as f32;
        let ox = self.origin.0 + (self.quiet_zone * self.module_px) as f32;
        let oy = self.origin.1 + (self.quiet_zone * self.module_px) as f32;
        PixelBox::new(
            ox + rect.x as f32 * m,
            oy + rect.y as f32 * m,
            ox + rect.right() as f32 * m,
            oy + rect.bottom() as f32 * m,
        )
    }

    /// Center pixel of the data module at `(x, y)`.
    pub fn module_center(&self, x: u32, y: u32) -> (f32, f32) {
        let m = self.module_px as f32;
        let ox = self.origin.0 + (self.quiet_zone * self.module_px) as f32;
        let oy = self.origin.1 + (self.quiet_zone * self.module_px) as f32;
        (ox + (x as f32 + 0.5) * m, oy + (y as f32 + 0.5) * m)
    }

    /// Top-left pixel of the data module at `(x, y)`.
    pub fn module_origin(&self, x: u32, y: u32) -> (f32, f32) {
        let m = self.module_px as f32;
        let ox = self.origin.0 + (self.quiet_zone * self.module_px) as f32;
        let oy = self.origin.1 + (self.quiet_zone * self.module_px) as f32;
        (ox + x as f32 * m, oy + y as f32 * m)
    }

    /// Bounding box of the data area (quiet zone excluded).
    pub fn core_box(&self) -> PixelBox {
        let m = self.module_px as f32;
        let ox = self.origin.0 + (self.quiet_zone * self.module_px) as f32;
        let oy = self.origin.1 + (self.quiet_zone * self.module_px) as f32;
        let side = self.data_modules as f32 * m;
        PixelBox::new(ox, oy, ox + side, oy + side)
    }

    /// Bounding box of the whole symbol including the quiet zone.
    pub fn full_box(&self) -> PixelBox {
        PixelBox::new(
            self.origin.0,
            self.origin.1,
            self.origin.0 + self.total_px(),
            self.origin.1 + self.total_px(),
        )
    }
}
