//! The end-to-end synthesis pipeline.

use std::time::{Duration, Instant};

use image::{ImageEncoder, RgbaImage, codecs::png::PngEncoder};
use tracing::{info, warn};

use qr_symbol::EcLevel;

use crate::compose::composite;
use crate::config::RunConfig;
use crate::layout::SymbolLayout;
use crate::report::RunReport;
use crate::select::select;
use crate::validate::validate;
use crate::{Result, ShaperError};

/// Everything a run produces: the PNG buffer, the raw raster and the
/// run report (which carries the validation verdict).
#[derive(Debug)]
pub struct Synthesis {
    pub png: Vec<u8>,
    pub image: RgbaImage,
    pub report: RunReport,
}

/// Run the full pipeline: encode, locate, select, composite, validate.
///
/// Structural errors (encoding, infeasible shape, decoration overlap,
/// missing assets) abort with no output. A failing scannability check
/// is a successful run with `verdict = FAIL` in the report.
pub async fn synthesize(payload: &str, config: &RunConfig) -> Result<Synthesis> {
    let started = Instant::now();

    if config.ec_level != EcLevel::H {
        warn!(
            level = %config.ec_level,
            "error-correction level below H leaves little headroom for shape clipping"
        );
    }

    let matrix = qr_symbol::generate(payload, config.ec_level)?;
    let regions = qr_symbol::locate(&matrix)?;

    let half = config.canvas_px as f32 / 2.0;
    let center = (
        half + config.silhouette.offset.0,
        half + config.silhouette.offset.1,
    );
    let layout = SymbolLayout::new(&matrix, config.qr_px, center);

    let selection = select(&regions, &layout, config)?;

    let image = composite(
        &matrix,
        &layout,
        &selection.plan,
        &selection.profile,
        &config.palette,
        &config.decoration,
        &regions,
        config.canvas_px,
    )?;

    let png = encode_png(&image)?;

    let validation = validate(
        &image,
        payload,
        &matrix,
        &layout,
        Duration::from_millis(config.decode_timeout_ms),
    )
    .await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        strategy = %selection.plan.strategy,
        verdict = ?validation.verdict,
        elapsed_ms,
        "Synthesis run complete"
    );

    let report = RunReport {
        payload: payload.to_string(),
        strategy: selection.plan.strategy,
        curve: selection.plan.curve,
        silhouette_scale: selection.plan.scale,
        canvas_px: config.canvas_px,
        module_px: layout.module_px(),
        qr_version: matrix.version(),
        ec_level: matrix.ec_level(),
        validation,
        output_path: None,
        generated_at: chrono::Local::now(),
        elapsed_ms,
    };

    Ok(Synthesis { png, image, report })
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    let encoder = PngEncoder::new(&mut png);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ShaperError::Image(e.to_string()))?;
    Ok(png)
}
