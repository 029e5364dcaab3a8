//! The externally observable record of one synthesis run.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use qr_symbol::EcLevel;
use silhouette::Curve;

use crate::plan::Strategy;
use crate::validate::ValidationResult;

/// Parameters used, validation verdict and output location for a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunReport {
    pub payload: String,
    pub strategy: Strategy,
    pub curve: Curve,
    /// Silhouette scale in pixels per curve unit.
    pub silhouette_scale: f32,
    pub canvas_px: u32,
    pub module_px: u32,
    pub qr_version: u8,
    pub ec_level: EcLevel,
    pub validation: ValidationResult,
    /// Set by the caller once the PNG has been written.
    pub output_path: Option<PathBuf>,
    pub generated_at: DateTime<Local>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Verdict;

    #[test]
    fn report_serializes_to_json() {
        let report = RunReport {
            payload: "https://example.com/menu".to_string(),
            strategy: Strategy::Clip,
            curve: Curve::Heart,
            silhouette_scale: 33.5,
            canvas_px: 1400,
            module_px: 15,
            qr_version: 3,
            ec_level: EcLevel::H,
            validation: ValidationResult {
                decoded_payload: Some("https://example.com/menu".to_string()),
                matches_original: true,
                modules_recovered_ratio: 0.97,
                verdict: Verdict::Pass,
            },
            output_path: Some("out/heart.png".into()),
            generated_at: Local::now(),
            elapsed_ms: 42,
        };
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"verdict\": \"PASS\""));
        assert!(json.contains("\"strategy\": \"clip\""));
    }
}
