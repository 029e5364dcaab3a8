//! Shape-constrained QR synthesis: fit a QR symbol into a decorative
//! silhouette while keeping it decodable.
//!
//! The pipeline is a synchronous chain over immutable inputs — encode,
//! locate protected structure, pick a transform plan, composite, then
//! decode the result back as a hard validation gate. Runs share no
//! mutable state and parallelize trivially.

pub mod compose;
pub mod config;
pub mod layout;
pub mod plan;
pub mod polar;
pub mod report;
pub mod select;
pub mod validate;

mod pipeline;

use std::path::PathBuf;

// Re-exports for convenience
pub use config::{Caption, Decoration, Logo, Palette, RunConfig, SilhouetteSpec};
pub use layout::SymbolLayout;
pub use pipeline::{Synthesis, synthesize};
pub use plan::{Strategy, TransformPlan};
pub use report::RunReport;
pub use validate::{ValidationResult, Verdict};

/// Errors that abort a synthesis run before any output is produced.
///
/// A failed scannability check is deliberately *not* an error: it is
/// returned as data inside [`ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum ShaperError {
    #[error(transparent)]
    Symbol(#[from] qr_symbol::SymbolError),

    #[error(
        "no transform plan satisfies containment \
         (attempted scales {attempted:?}, max feasible {max_scale:.1})"
    )]
    InfeasibleShape { attempted: Vec<f32>, max_scale: f32 },

    #[error("decoration '{what}' overlaps protected region {region}")]
    DecorationOverlap { what: String, region: String },

    #[error("failed to load asset {path}: {reason}")]
    Asset { path: PathBuf, reason: String },

    #[error("invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("image error: {0}")]
    Image(String),
}

/// Result type alias for shaper operations.
pub type Result<T> = std::result::Result<T, ShaperError>;
