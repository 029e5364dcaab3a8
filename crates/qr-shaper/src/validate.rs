//! Scannability validation: decode the composite back and compare.
//!
//! A failed decode is a normal outcome for aggressive plans — it is
//! returned as data so batch tooling can retry with a more
//! conservative strategy. Only the pass/fail of the decoder's own
//! error correction decides the verdict; the module recovery ratio is
//! diagnostic.

use std::time::Duration;

use image::{GrayImage, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use qr_symbol::SymbolMatrix;

use crate::layout::SymbolLayout;

/// Threshold between dark and light when resampling modules.
const LUMA_THRESHOLD: u8 = 128;

/// Outcome of validating one composite image.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub decoded_payload: Option<String>,
    pub matches_original: bool,
    /// Fraction of module grid positions that still read back with the
    /// expected polarity at their pre-transform coordinates. Purely
    /// diagnostic — a morph displaces content away from those
    /// coordinates by design, and the verdict never depends on this.
    pub modules_recovered_ratio: f32,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Decode `image` and compare against `expected`.
///
/// The decode runs on a blocking task under a hard timeout; expiry is
/// reported as a failed validation, never an error.
pub async fn validate(
    image: &RgbaImage,
    expected: &str,
    matrix: &SymbolMatrix,
    layout: &SymbolLayout,
    timeout: Duration,
) -> ValidationResult {
    let gray = to_gray(image);
    let ratio = recovered_ratio(&gray, matrix, layout);

    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let raw = gray.into_raw();
    let decode = tokio::task::spawn_blocking(move || decode_gray(w, h, raw));

    let decoded = match tokio::time::timeout(timeout, decode).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            warn!("decode task failed: {join_err}");
            None
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "decode timed out");
            None
        }
    };

    let matches = decoded.as_deref() == Some(expected);
    let verdict = if matches { Verdict::Pass } else { Verdict::Fail };
    debug!(?verdict, ratio, "Validated composite");

    ValidationResult {
        decoded_payload: decoded,
        matches_original: matches,
        modules_recovered_ratio: ratio,
        verdict,
    }
}

fn to_gray(image: &RgbaImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (x, y, p) in image.enumerate_pixels() {
        let luma =
            (0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32).round() as u8;
        gray.put_pixel(x, y, image::Luma([luma]));
    }
    gray
}

fn decode_gray(width: usize, height: usize, raw: Vec<u8>) -> Option<String> {
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| raw[y * width + x]);
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return None;
    }
    match grids[0].decode() {
        Ok((meta, content)) => {
            debug!(
                version = ?meta.version,
                ecc_level = meta.ecc_level,
                "Decoded composite"
            );
            Some(content)
        }
        Err(e) => {
            debug!("decode failed: {e:?}");
            None
        }
    }
}

/// Resample every module grid position at its pre-transform pixel
/// coordinate and count how many kept the expected polarity after
/// compositing. Clipping costs the modules outside the silhouette;
/// a morph additionally displaces content off these coordinates.
fn recovered_ratio(gray: &GrayImage, matrix: &SymbolMatrix, layout: &SymbolLayout) -> f32 {
    let side = matrix.side();
    let mut matched = 0u32;
    for my in 0..side {
        for mx in 0..side {
            let (sx, sy) = layout.module_center(mx, my);
            let px = (sx.round().max(0.0) as u32).min(gray.width() - 1);
            let py = (sy.round().max(0.0) as u32).min(gray.height() - 1);
            let dark = gray.get_pixel(px, py).0[0] < LUMA_THRESHOLD;
            if dark == matrix.is_dark(mx, my) {
                matched += 1;
            }
        }
    }
    matched as f32 / (side * side) as f32
}
