//! Transform strategy selection.
//!
//! Clip first — it never damages QR structure. Fall back to clipping
//! against the widened-top curve when the pure silhouette cannot hold
//! the protected regions at a scale the canvas fits. PolarMorph is
//! only ever used when a caller asks for it by name.

use qr_symbol::{ProtectedRegion, RegionName};
use silhouette::{Curve, Mask, RadialProfile};
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::layout::SymbolLayout;
use crate::plan::{Strategy, TransformPlan};
use crate::polar::PolarMap;
use crate::{Result, ShaperError};

/// A chosen plan plus the radial profile it was validated against.
#[derive(Debug)]
pub struct Selection {
    pub plan: TransformPlan,
    pub profile: RadialProfile,
}

/// Pick and parameterize a transform plan.
///
/// Fails with [`ShaperError::InfeasibleShape`] when no scale satisfies
/// containment within the canvas; a caller-forced scale is checked the
/// same way rather than silently clipping a finder.
pub fn select(
    regions: &[ProtectedRegion],
    layout: &SymbolLayout,
    config: &RunConfig,
) -> Result<Selection> {
    let center = layout.qr_center();

    match config.strategy {
        Some(Strategy::PolarMorph) => polar_plan(regions, layout, config, center),
        Some(Strategy::Clip) => clip_plan(regions, layout, config, center, Curve::Heart, false),
        Some(Strategy::EnlargedSafeClip) => {
            clip_plan(regions, layout, config, center, Curve::BridgedHeart, false)
        }
        None => clip_plan(
            regions,
            layout,
            config,
            center,
            config.silhouette.curve,
            true,
        ),
    }
}

fn clip_plan(
    regions: &[ProtectedRegion],
    layout: &SymbolLayout,
    config: &RunConfig,
    center: (f32, f32),
    curve: Curve,
    allow_fallback: bool,
) -> Result<Selection> {
    let margin_modules = config.margin_modules.max(1);
    let margin_px = (margin_modules * layout.module_px()) as f32;

    let profile = RadialProfile::of(&curve);
    let ceiling = max_canvas_scale(&profile, center, config);
    let required = required_scale(&profile, regions, layout, center, margin_px);
    debug!(%curve, required, ceiling, "Containment scale bounds");

    let scale = match forced_scale(config) {
        Some(forced) => {
            if forced < required * (1.0 - 1e-4) || forced > ceiling {
                return Err(ShaperError::InfeasibleShape {
                    attempted: vec![forced],
                    max_scale: ceiling,
                });
            }
            forced
        }
        None => {
            if required <= ceiling {
                // A sliver above the exact bound keeps the binding
                // containment point strictly inside.
                (required * 1.001).min(ceiling)
            } else if allow_fallback && curve == Curve::Heart {
                // The notch is usually what forces the scale up; retry
                // against the bridged-top curve before giving up.
                return clip_plan(regions, layout, config, center, Curve::BridgedHeart, false)
                    .map_err(|e| prepend_attempt(e, required));
            } else {
                return Err(ShaperError::InfeasibleShape {
                    attempted: vec![required],
                    max_scale: ceiling,
                });
            }
        }
    };

    let strategy = match curve {
        Curve::Heart => Strategy::Clip,
        Curve::BridgedHeart => Strategy::EnlargedSafeClip,
    };
    info!(%strategy, scale, "Selected transform plan");

    Ok(Selection {
        plan: TransformPlan {
            strategy,
            curve,
            scale,
            center,
            border_px: config.border_px,
            margin_modules,
        },
        profile,
    })
}

fn polar_plan(
    regions: &[ProtectedRegion],
    layout: &SymbolLayout,
    config: &RunConfig,
    center: (f32, f32),
) -> Result<Selection> {
    let margin_modules = config.margin_modules.max(1);
    let margin_px = (margin_modules * layout.module_px()) as f32;

    let profile = RadialProfile::of(&config.silhouette.curve);
    let ceiling = max_canvas_scale(&profile, center, config);
    let scale = forced_scale(config).unwrap_or(ceiling * 0.92);
    if scale <= 0.0 || scale > ceiling {
        return Err(ShaperError::InfeasibleShape {
            attempted: vec![scale],
            max_scale: ceiling,
        });
    }

    // The morph maps the whole square into the silhouette, so the
    // containment invariant is checked on the post-transform positions
    // of the three finder centroids instead of their source boxes.
    let mask = Mask::new(&profile, center, scale);
    let map = PolarMap::new(
        &profile,
        center,
        scale,
        layout.qr_center(),
        layout.total_px() / 2.0,
    );
    for region in regions.iter().filter(|r| is_finder(r.name)) {
        let (sx, sy) = layout.module_box(&region.bounds).center();
        let (ox, oy) = map.to_output(sx, sy);
        if mask.margin_px(ox, oy) < margin_px {
            return Err(ShaperError::InfeasibleShape {
                attempted: vec![scale],
                max_scale: ceiling,
            });
        }
    }

    info!(scale, "Selected polar-morph plan (explicit opt-in)");
    Ok(Selection {
        plan: TransformPlan {
            strategy: Strategy::PolarMorph,
            curve: config.silhouette.curve,
            scale,
            center,
            border_px: config.border_px,
            margin_modules,
        },
        profile,
    })
}

fn forced_scale(config: &RunConfig) -> Option<f32> {
    match (config.silhouette.auto_fit, config.silhouette.scale) {
        (false, Some(s)) => Some(s),
        _ => None,
    }
}

fn is_finder(name: RegionName) -> bool {
    matches!(
        name,
        RegionName::FinderTl | RegionName::FinderTr | RegionName::FinderBl
    )
}

/// Smallest scale at which every protected region sits inside the
/// curve with `margin_px` of clearance. Closed form: for each sample
/// point, scale must be at least (distance + margin) / boundary radius
/// along that point's angle.
fn required_scale(
    profile: &RadialProfile,
    regions: &[ProtectedRegion],
    layout: &SymbolLayout,
    center: (f32, f32),
    margin_px: f32,
) -> f32 {
    let mut needed = 0.0f32;
    for region in regions {
        for (px, py) in layout.module_box(&region.bounds).sample_points() {
            let dx = px - center.0;
            let dy = py - center.1;
            let dist = dx.hypot(dy);
            if dist == 0.0 {
                continue;
            }
            let radius = profile.radius_at(dy.atan2(dx));
            if radius <= 0.0 {
                return f32::INFINITY;
            }
            needed = needed.max((dist + margin_px) / radius);
        }
    }
    needed
}

/// Largest scale at which the silhouette still fits the canvas with a
/// small pad for the stroke.
fn max_canvas_scale(profile: &RadialProfile, center: (f32, f32), config: &RunConfig) -> f32 {
    let pad = config.border_px + 4.0;
    let limit = config.canvas_px as f32;
    let mut ceiling = f32::MAX;
    for (angle, radius) in profile.directions() {
        if radius <= 0.0 {
            continue;
        }
        let reach = distance_to_edge(center, angle, pad, limit);
        ceiling = ceiling.min(reach / radius);
    }
    ceiling
}

fn distance_to_edge(center: (f32, f32), angle: f32, pad: f32, limit: f32) -> f32 {
    let (dx, dy) = (angle.cos(), angle.sin());
    let tx = if dx > 1e-6 {
        (limit - pad - center.0) / dx
    } else if dx < -1e-6 {
        (pad - center.0) / dx
    } else {
        f32::MAX
    };
    let ty = if dy > 1e-6 {
        (limit - pad - center.1) / dy
    } else if dy < -1e-6 {
        (pad - center.1) / dy
    } else {
        f32::MAX
    };
    tx.min(ty).max(0.0)
}

fn prepend_attempt(err: ShaperError, scale: f32) -> ShaperError {
    match err {
        ShaperError::InfeasibleShape {
            mut attempted,
            max_scale,
        } => {
            attempted.insert(0, scale);
            ShaperError::InfeasibleShape {
                attempted,
                max_scale,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qr_symbol::{EcLevel, generate, locate};

    fn fixture(config: &RunConfig) -> (Vec<ProtectedRegion>, SymbolLayout) {
        let matrix = generate("https://example.com/menu", EcLevel::H).unwrap();
        let regions = locate(&matrix).unwrap();
        let half = config.canvas_px as f32 / 2.0;
        let layout = SymbolLayout::new(&matrix, config.qr_px, (half, half));
        (regions, layout)
    }

    #[test]
    fn auto_fit_plan_contains_every_protected_region() {
        let config = RunConfig::default();
        let (regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();

        let mask = Mask::new(&selection.profile, selection.plan.center, selection.plan.scale);
        let margin = (selection.plan.margin_modules * layout.module_px()) as f32;
        for region in &regions {
            assert!(
                mask.contains_box(&layout.module_box(&region.bounds), margin),
                "{} escaped the silhouette",
                region.name
            );
        }
    }

    #[test]
    fn polar_morph_is_never_auto_selected() {
        let config = RunConfig::default();
        let (regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        assert_ne!(selection.plan.strategy, Strategy::PolarMorph);
    }

    #[test]
    fn forced_tiny_scale_is_infeasible() {
        let config = RunConfig::new().with_scale(5.0);
        let (regions, layout) = fixture(&config);
        let err = select(&regions, &layout, &config).unwrap_err();
        match err {
            ShaperError::InfeasibleShape {
                attempted,
                max_scale,
            } => {
                assert_eq!(attempted, vec![5.0]);
                assert!(max_scale > 0.0);
            }
            other => panic!("expected InfeasibleShape, got {other:?}"),
        }
    }

    #[test]
    fn explicit_safe_clip_uses_the_bridged_curve() {
        let config = RunConfig::new().with_strategy(Strategy::EnlargedSafeClip);
        let (regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        assert_eq!(selection.plan.strategy, Strategy::EnlargedSafeClip);
        assert_eq!(selection.plan.curve, Curve::BridgedHeart);
    }

    #[test]
    fn explicit_polar_morph_is_honored() {
        let config = RunConfig::new().with_strategy(Strategy::PolarMorph);
        let (regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();
        assert_eq!(selection.plan.strategy, Strategy::PolarMorph);
        assert!(selection.plan.scale > 0.0);
    }

    #[test]
    fn clip_picks_the_smallest_feasible_scale() {
        let config = RunConfig::default();
        let (regions, layout) = fixture(&config);
        let selection = select(&regions, &layout, &config).unwrap();

        // Shrinking the chosen scale by a few percent must break
        // containment for at least one region.
        let shrunk = selection.plan.scale * 0.95;
        let mask = Mask::new(&selection.profile, selection.plan.center, shrunk);
        let margin = (selection.plan.margin_modules * layout.module_px()) as f32;
        let all_contained = regions
            .iter()
            .all(|r| mask.contains_box(&layout.module_box(&r.bounds), margin));
        assert!(!all_contained);
    }
}
