//! Rasterization of the final composite image.
//!
//! Fixed z-order: background gradient, QR layer (clipped 1:1 or
//! polar-resampled), silhouette stroke, then decoration. Decoration
//! layout is checked against the functional QR area before any pixel
//! is rendered.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::debug;

use qr_symbol::{ProtectedRegion, SymbolMatrix};
use silhouette::{Mask, PixelBox, RadialProfile};

use crate::config::{Caption, Decoration, Logo, Palette};
use crate::layout::SymbolLayout;
use crate::plan::{Strategy, TransformPlan};
use crate::polar::PolarMap;
use crate::{Result, ShaperError};

/// Clearance kept between decorations and the canvas edge.
const EDGE_PAD: f32 = 24.0;

/// Render the composite image for a chosen plan.
///
/// Fails with [`ShaperError::DecorationOverlap`] before anything is
/// drawn when the decoration layout intersects the symbol's functional
/// area, and with [`ShaperError::Asset`] when a decoration asset
/// cannot be loaded.
pub fn composite(
    matrix: &SymbolMatrix,
    layout: &SymbolLayout,
    plan: &TransformPlan,
    profile: &RadialProfile,
    palette: &Palette,
    decoration: &Decoration,
    regions: &[ProtectedRegion],
    canvas_px: u32,
) -> Result<RgbaImage> {
    // Decoration layout gate runs first: a bad layout must be rejected
    // before any pixel exists.
    let planned = plan_decoration(decoration, canvas_px);
    ensure_decoration_clear(&planned, layout, regions)?;

    let mut img = background(canvas_px, palette);

    match plan.strategy {
        Strategy::Clip | Strategy::EnlargedSafeClip => {
            draw_clipped(&mut img, matrix, layout, plan, profile, palette);
        }
        Strategy::PolarMorph => {
            draw_morphed(&mut img, matrix, layout, plan, profile, palette);
        }
    }

    draw_stroke(&mut img, plan, profile, palette);

    render_decoration(&mut img, &planned, layout, regions, palette)?;

    debug!(strategy = %plan.strategy, canvas_px, "Composited image");
    Ok(img)
}

/// Vertical two-stop gradient background.
fn background(canvas_px: u32, palette: &Palette) -> RgbaImage {
    let mut img = RgbaImage::new(canvas_px, canvas_px);
    let span = (canvas_px.max(2) - 1) as f32;
    for y in 0..canvas_px {
        let t = y as f32 / span;
        let color = Rgba([
            lerp_u8(palette.bg_top[0], palette.bg_bottom[0], t),
            lerp_u8(palette.bg_top[1], palette.bg_bottom[1], t),
            lerp_u8(palette.bg_top[2], palette.bg_bottom[2], t),
            255,
        ]);
        for x in 0..canvas_px {
            img.put_pixel(x, y, color);
        }
    }
    img
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Draw the symbol 1:1 and discard everything outside the clip mask.
///
/// The mask interior is flooded with the light color first, so modules
/// lost to the clip read as light — errors for the decoder's
/// error-correction to absorb, not holes in the background.
fn draw_clipped(
    img: &mut RgbaImage,
    matrix: &SymbolMatrix,
    layout: &SymbolLayout,
    plan: &TransformPlan,
    profile: &RadialProfile,
    palette: &Palette,
) {
    let clip = Mask::new(profile, plan.center, plan.scale).with_inset_px(plan.border_px);
    let light = Rgba([palette.light[0], palette.light[1], palette.light[2], 255]);
    let dark = Rgba([palette.dark[0], palette.dark[1], palette.dark[2], 255]);

    let (x0, y0, x1, y1) = clamp_box(&clip.bounds_px(), img.width(), img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            if clip.contains(px as f32 + 0.5, py as f32 + 0.5) {
                img.put_pixel(px, py, light);
            }
        }
    }

    let m = layout.module_px();
    for my in 0..matrix.side() {
        for mx in 0..matrix.side() {
            if !matrix.is_dark(mx, my) {
                continue;
            }
            let (ox, oy) = layout.module_origin(mx, my);
            for dy in 0..m {
                for dx in 0..m {
                    let fx = ox + dx as f32;
                    let fy = oy + dy as f32;
                    if fx < 0.0 || fy < 0.0 {
                        continue;
                    }
                    let (px, py) = (fx as u32, fy as u32);
                    if px < img.width()
                        && py < img.height()
                        && clip.contains(fx + 0.5, fy + 0.5)
                    {
                        img.put_pixel(px, py, dark);
                    }
                }
            }
        }
    }
}

/// Resample the square symbol into the silhouette pixel by pixel.
fn draw_morphed(
    img: &mut RgbaImage,
    matrix: &SymbolMatrix,
    layout: &SymbolLayout,
    plan: &TransformPlan,
    profile: &RadialProfile,
    palette: &Palette,
) {
    let source = render_square(matrix, layout, palette);
    let full = layout.full_box();
    let fill = Mask::new(profile, plan.center, plan.scale);
    let map = PolarMap::new(
        profile,
        plan.center,
        plan.scale,
        layout.qr_center(),
        layout.total_px() / 2.0,
    );

    let (x0, y0, x1, y1) = clamp_box(&fill.bounds_px(), img.width(), img.height());
    let max_s = source.width() as f32 - 1.0;
    for py in y0..y1 {
        for px in x0..x1 {
            let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
            if !fill.contains(fx, fy) {
                continue;
            }
            let (sx, sy) = map.to_source(fx, fy);
            let lx = (sx - full.x0).clamp(0.0, max_s) as u32;
            let ly = (sy - full.y0).clamp(0.0, max_s) as u32;
            img.put_pixel(px, py, *source.get_pixel(lx, ly));
        }
    }
}

/// Render the symbol (quiet zone included) into its own buffer at 1:1.
fn render_square(matrix: &SymbolMatrix, layout: &SymbolLayout, palette: &Palette) -> RgbaImage {
    let m = layout.module_px();
    let total_px = layout.total_modules() * m;
    let light = Rgba([palette.light[0], palette.light[1], palette.light[2], 255]);
    let dark = Rgba([palette.dark[0], palette.dark[1], palette.dark[2], 255]);

    let mut img = RgbaImage::from_pixel(total_px, total_px, light);
    let qz = layout.quiet_zone();
    for my in 0..matrix.side() {
        for mx in 0..matrix.side() {
            if !matrix.is_dark(mx, my) {
                continue;
            }
            let px0 = (qz + mx) * m;
            let py0 = (qz + my) * m;
            for py in py0..py0 + m {
                for px in px0..px0 + m {
                    img.put_pixel(px, py, dark);
                }
            }
        }
    }
    img
}

/// Stroke the silhouette outline as a band centered on the boundary.
fn draw_stroke(img: &mut RgbaImage, plan: &TransformPlan, profile: &RadialProfile, palette: &Palette) {
    if plan.border_px <= 0.0 {
        return;
    }
    let mask = Mask::new(profile, plan.center, plan.scale);
    let stroke = Rgba([palette.stroke[0], palette.stroke[1], palette.stroke[2], 255]);
    let half = plan.border_px / 2.0;

    let bounds = mask.bounds_px();
    let padded = PixelBox::new(
        bounds.x0 - half,
        bounds.y0 - half,
        bounds.x1 + half,
        bounds.y1 + half,
    );
    let (x0, y0, x1, y1) = clamp_box(&padded, img.width(), img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            if mask.margin_px(px as f32 + 0.5, py as f32 + 0.5).abs() <= half {
                img.put_pixel(px, py, stroke);
            }
        }
    }
}

fn clamp_box(b: &PixelBox, w: u32, h: u32) -> (u32, u32, u32, u32) {
    let x0 = b.x0.floor().max(0.0) as u32;
    let y0 = b.y0.floor().max(0.0) as u32;
    let x1 = (b.x1.ceil().max(0.0) as u32).min(w);
    let y1 = (b.y1.ceil().max(0.0) as u32).min(h);
    (x0, y0, x1, y1)
}

struct PlannedCaption<'a> {
    caption: &'a Caption,
    bounds: PixelBox,
}

struct PlannedLogo<'a> {
    logo: &'a Logo,
    bounds: PixelBox,
}

struct DecorationPlan<'a> {
    caption: Option<PlannedCaption<'a>>,
    logo: Option<PlannedLogo<'a>>,
}

/// Compute decoration boxes without touching any asset. Caption width
/// uses a flat per-glyph advance estimate; the true measured box is
/// re-checked once the font is loaded.
fn plan_decoration(decoration: &Decoration, canvas_px: u32) -> DecorationPlan<'_> {
    let caption = decoration.caption.as_ref().map(|c| {
        let width = estimate_text_width(&c.text, c.px);
        let height = c.px * 1.4;
        let (x, y) = match c.origin {
            Some((x, y)) => (x as f32, y as f32),
            None => (
                (canvas_px as f32 - width) / 2.0,
                canvas_px as f32 - EDGE_PAD - height,
            ),
        };
        PlannedCaption {
            caption: c,
            bounds: PixelBox::new(x, y, x + width, y + height),
        }
    });

    let logo = decoration.logo.as_ref().map(|l| {
        let (x, y) = match l.origin {
            Some((x, y)) => (x as f32, y as f32),
            None => (EDGE_PAD, EDGE_PAD),
        };
        PlannedLogo {
            logo: l,
            bounds: PixelBox::new(x, y, x + l.px as f32, y + l.px as f32),
        }
    });

    DecorationPlan { caption, logo }
}

fn estimate_text_width(text: &str, px: f32) -> f32 {
    text.chars().count() as f32 * px * 0.6
}

fn ensure_decoration_clear(
    planned: &DecorationPlan<'_>,
    layout: &SymbolLayout,
    regions: &[ProtectedRegion],
) -> Result<()> {
    if let Some(c) = &planned.caption {
        ensure_box_clear("caption", &c.bounds, layout, regions)?;
    }
    if let Some(l) = &planned.logo {
        ensure_box_clear("logo", &l.bounds, layout, regions)?;
    }
    Ok(())
}

/// A decoration may never touch the functional symbol area: protected
/// regions are reported by name, anything else inside the data square
/// as the data area itself.
fn ensure_box_clear(
    what: &str,
    bounds: &PixelBox,
    layout: &SymbolLayout,
    regions: &[ProtectedRegion],
) -> Result<()> {
    for region in regions {
        if bounds.intersects(&layout.module_box(&region.bounds)) {
            return Err(ShaperError::DecorationOverlap {
                what: what.to_string(),
                region: region.name.to_string(),
            });
        }
    }
    if bounds.intersects(&layout.core_box()) {
        return Err(ShaperError::DecorationOverlap {
            what: what.to_string(),
            region: "symbol-data-area".to_string(),
        });
    }
    Ok(())
}

fn render_decoration(
    img: &mut RgbaImage,
    planned: &DecorationPlan<'_>,
    layout: &SymbolLayout,
    regions: &[ProtectedRegion],
    palette: &Palette,
) -> Result<()> {
    if let Some(planned_caption) = &planned.caption {
        draw_caption(img, planned_caption, layout, regions, palette)?;
    }
    if let Some(planned_logo) = &planned.logo {
        draw_logo(img, planned_logo)?;
    }
    Ok(())
}

fn draw_caption(
    img: &mut RgbaImage,
    planned: &PlannedCaption<'_>,
    layout: &SymbolLayout,
    regions: &[ProtectedRegion],
    palette: &Palette,
) -> Result<()> {
    let caption = planned.caption;
    let bytes = std::fs::read(&caption.font_path).map_err(|e| ShaperError::Asset {
        path: caption.font_path.clone(),
        reason: e.to_string(),
    })?;
    let font = FontVec::try_from_vec(bytes).map_err(|e| ShaperError::Asset {
        path: caption.font_path.clone(),
        reason: e.to_string(),
    })?;

    let scale = PxScale::from(caption.px);
    let width = measure_text_width(&font, scale, &caption.text);
    let (x, y) = match caption.origin {
        Some((ox, oy)) => (ox as f32, oy as f32),
        None => (
            (img.width() as f32 - width) / 2.0,
            planned.bounds.y0,
        ),
    };
    // Re-check with real metrics; the estimate can undershoot wide text.
    let measured = PixelBox::new(x, y, x + width, y + caption.px * 1.4);
    ensure_box_clear("caption", &measured, layout, regions)?;

    let color = Rgba([palette.dark[0], palette.dark[1], palette.dark[2], 255]);
    draw_text_mut(img, color, x as i32, y as i32, scale, &font, &caption.text);
    Ok(())
}

fn draw_logo(img: &mut RgbaImage, planned: &PlannedLogo<'_>) -> Result<()> {
    let logo = planned.logo;
    let loaded = image::open(&logo.path).map_err(|e| ShaperError::Asset {
        path: logo.path.clone(),
        reason: e.to_string(),
    })?;
    let resized = loaded.resize_exact(logo.px, logo.px, FilterType::Lanczos3);
    overlay(img, &resized, planned.bounds.x0 as u32, planned.bounds.y0 as u32);
    Ok(())
}

/// Measure the pixel width of a line at the given font and scale.
fn measure_text_width<F: Font>(font: &F, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev: Option<ab_glyph::GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Alpha-composite `top` onto `base` at the given position.
fn overlay(base: &mut RgbaImage, top: &DynamicImage, x: u32, y: u32) {
    let top_rgba = top.to_rgba8();
    for (dx, dy, pixel) in top_rgba.enumerate_pixels() {
        let tx = x + dx;
        let ty = y + dy;
        if tx >= base.width() || ty >= base.height() {
            continue;
        }
        let alpha = pixel[3] as f32 / 255.0;
        if alpha > 0.99 {
            base.put_pixel(tx, ty, *pixel);
        } else if alpha > 0.01 {
            let bg = base.get_pixel(tx, ty);
            base.put_pixel(tx, ty, blend_pixel(bg, pixel, alpha));
        }
    }
}

fn blend_pixel(bg: &Rgba<u8>, fg: &Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let inv = 1.0 - alpha;
    Rgba([
        (fg[0] as f32 * alpha + bg[0] as f32 * inv) as u8,
        (fg[1] as f32 * alpha + bg[1] as f32 * inv) as u8,
        (fg[2] as f32 * alpha + bg[2] as f32 * inv) as u8,
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::select::select;
    use qr_symbol::{EcLevel, generate, locate};

    fn fixture(config: &RunConfig) -> (SymbolMatrix, Vec<ProtectedRegion>, SymbolLayout) {
        let matrix = generate("https://example.com/menu", EcLevel::H).unwrap();
        let regions = locate(&matrix).unwrap();
        let half = config.canvas_px as f32 / 2.0;
        let layout = SymbolLayout::new(&matrix, config.qr_px, (half, half));
        (matrix, regions, layout)
    }

    fn composited(config: &RunConfig) -> RgbaImage {
        let (matrix, regions, layout) = fixture(config);
        let selection = select(&regions, &layout, config).unwrap();
        composite(
            &matrix,
            &layout,
            &selection.plan,
            &selection.profile,
            &config.palette,
            &config.decoration,
            &regions,
            config.canvas_px,
        )
        .unwrap()
    }

    #[test]
    fn background_gradient_spans_the_configured_stops() {
        let palette = Palette::default();
        let img = background(64, &palette);
        assert_eq!(img.get_pixel(0, 0).0[..3], palette.bg_top);
        assert_eq!(img.get_pixel(0, 63).0[..3], palette.bg_bottom);
    }

    #[test]
    fn canvas_corners_stay_background() {
        let config = RunConfig::default();
        let img = composited(&config);
        let corner = img.get_pixel(2, 2);
        assert_eq!(corner.0[..3], config.palette.bg_top);
    }

    #[test]
    fn symbol_center_region_is_rendered() {
        let config = RunConfig::default();
        let img = composited(&config);
        // The area around the canvas center must hold QR colors.
        let mut qr_pixels = 0;
        for dy in 0..40u32 {
            for dx in 0..40u32 {
                let p = img.get_pixel(680 + dx, 680 + dy);
                if p.0[..3] == config.palette.dark || p.0[..3] == config.palette.light {
                    qr_pixels += 1;
                }
            }
        }
        assert_eq!(qr_pixels, 40 * 40);
    }

    #[test]
    fn stroke_band_marks_the_boundary() {
        let config = RunConfig::default();
        let (_, regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        let img = composited(&config);

        // Walk right from the anchor to the boundary.
        let mask = Mask::new(&selection.profile, selection.plan.center, selection.plan.scale);
        let r = selection.profile.radius_at(0.0) * selection.plan.scale;
        let x = (selection.plan.center.0 + r) as u32;
        let y = selection.plan.center.1 as u32;
        assert!(mask.margin_px(x as f32, y as f32).abs() < selection.plan.border_px);
        assert_eq!(img.get_pixel(x, y).0[..3], config.palette.stroke);
    }

    #[test]
    fn caption_in_the_symbol_box_is_rejected_before_rendering() {
        let mut config = RunConfig::default();
        config.decoration.caption = Some(Caption {
            text: "table for two".to_string(),
            // Deliberately bogus: the overlap gate must fire before
            // any asset is touched.
            font_path: "/nonexistent/font.ttf".into(),
            px: 48.0,
            origin: Some((700, 700)),
        });
        let (matrix, regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        let err = composite(
            &matrix,
            &layout,
            &selection.plan,
            &selection.profile,
            &config.palette,
            &config.decoration,
            &regions,
            config.canvas_px,
        )
        .unwrap_err();
        assert!(
            matches!(err, ShaperError::DecorationOverlap { ref what, .. } if what == "caption"),
            "got {err:?}"
        );
    }

    #[test]
    fn logo_over_a_finder_names_the_region() {
        let mut config = RunConfig::default();
        config.decoration.logo = Some(Logo {
            path: "/nonexistent/logo.png".into(),
            px: 120,
            origin: None,
        });
        let (matrix, regions, layout) = fixture(&config);
        // Park the logo square on the top-left finder.
        let finder = layout.module_box(&regions[0].bounds);
        config.decoration.logo.as_mut().unwrap().origin =
            Some((finder.x0 as i32, finder.y0 as i32));

        let selection = select(&regions, &layout, &config).unwrap();
        let err = composite(
            &matrix,
            &layout,
            &selection.plan,
            &selection.profile,
            &config.palette,
            &config.decoration,
            &regions,
            config.canvas_px,
        )
        .unwrap_err();
        match err {
            ShaperError::DecorationOverlap { what, region } => {
                assert_eq!(what, "logo");
                assert_eq!(region, "finder-TL");
            }
            other => panic!("expected DecorationOverlap, got {other:?}"),
        }
    }

    #[test]
    fn missing_font_with_a_clear_layout_is_an_asset_error() {
        let mut config = RunConfig::default();
        config.decoration.caption = Some(Caption {
            text: "see you soon".to_string(),
            font_path: "/nonexistent/font.ttf".into(),
            px: 48.0,
            origin: None,
        });
        let (matrix, regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        let err = composite(
            &matrix,
            &layout,
            &selection.plan,
            &selection.profile,
            &config.palette,
            &config.decoration,
            &regions,
            config.canvas_px,
        )
        .unwrap_err();
        assert!(matches!(err, ShaperError::Asset { .. }), "got {err:?}");
    }
}
