//! Immutable QR module grid built from a payload string.

use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{QUIET_ZONE_MODULES, Result, SymbolError};

/// Error-correction level of a symbol.
///
/// Shape transforms deliberately sacrifice module fidelity at the
/// silhouette boundary, so synthesis runs are expected to use `H`
/// (30% codeword redundancy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcLevel {
    L,
    M,
    Q,
    H,
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl std::fmt::Display for EcLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        };
        f.write_str(s)
    }
}

/// A square grid of dark/light modules plus the symbol parameters.
///
/// Read-only after construction; `generate` is deterministic, so the
/// same payload and EC level always yield a byte-identical grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatrix {
    modules: Vec<bool>,
    side: u32,
    version: u8,
    ec_level: EcLevel,
    quiet_zone_modules: u32,
}

impl SymbolMatrix {
    pub(crate) fn from_modules(
        modules: Vec<bool>,
        version: u8,
        ec_level: EcLevel,
        quiet_zone_modules: u32,
    ) -> Result<Self> {
        let side = 17 + 4 * u32::from(version);
        if modules.len() as u32 != side * side {
            return Err(SymbolError::MalformedMatrix {
                side: (modules.len() as f64).sqrt() as u32,
                version,
            });
        }
        Ok(Self {
            modules,
            side,
            version,
            ec_level,
            quiet_zone_modules,
        })
    }

    /// Side length in modules (quiet zone excluded).
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Symbol version (1..=40).
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn ec_level(&self) -> EcLevel {
        self.ec_level
    }

    pub fn quiet_zone_modules(&self) -> u32 {
        self.quiet_zone_modules
    }

    /// Whether the module at `(x, y)` is dark.
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the grid.
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        assert!(x < self.side && y < self.side, "module ({x}, {y}) out of range");
        self.modules[(y * self.side + x) as usize]
    }
}

/// Encode a payload string into a symbol matrix at the given EC level.
///
/// Fails with [`SymbolError::Encoding`] when the payload exceeds the
/// capacity of the largest version at that level. No side effects.
pub fn generate(payload: &str, ec_level: EcLevel) -> Result<SymbolMatrix> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ec_level.into())?;

    let version = match code.version() {
        qrcode::Version::Normal(v) => v as u8,
        // `with_error_correction_level` only ever selects normal versions.
        qrcode::Version::Micro(_) => unreachable!("micro symbols are never auto-selected"),
    };

    let modules: Vec<bool> = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();

    debug!(
        version,
        side = code.width(),
        len = payload.len(),
        "Encoded payload into QR symbol"
    );

    SymbolMatrix::from_modules(modules, version, ec_level, QUIET_ZONE_MODULES)
}
