//! QR symbol generation and structural region location.
//!
//! Wraps the `qrcode` encoder into an immutable module grid and computes
//! the regions of the symbol (finders, timing, format/version info) that
//! a shape transform must leave geometrically intact.

pub mod matrix;
pub mod regions;

// Re-exports for convenience
pub use matrix::{EcLevel, SymbolMatrix, generate};
pub use regions::{ModuleRect, ProtectedRegion, RegionName, locate};

/// Side length of a finder pattern, in modules.
pub const FINDER_SIDE: u32 = 7;

/// Default quiet zone width, in modules (the standard mandates >= 4).
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Errors that can occur while building or inspecting a symbol.
#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("payload cannot be encoded: {0}")]
    Encoding(#[from] qrcode::types::QrError),

    #[error("malformed matrix: side {side} does not match version {version}")]
    MalformedMatrix { side: u32, version: u8 },
}

/// Result type alias for symbol operations.
pub type Result<T> = std::result::Result<T, SymbolError>;
