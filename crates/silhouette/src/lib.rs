//! Parametric silhouette curves and angular/radial containment masks.
//!
//! A curve is sampled once into a [`RadialProfile`] (angle -> boundary
//! radius around a fixed interior anchor); every consumer — containment
//! checks, clipping, stroke rendering, polar resampling — shares that
//! single primitive instead of re-deriving the curve formula.

pub mod curve;
pub mod mask;
pub mod profile;

// Re-exports for convenience
pub use curve::Curve;
pub use mask::{Mask, PixelBox};
pub use profile::RadialProfile;

/// Errors from silhouette configuration.
#[derive(Debug, thiserror::Error)]
pub enum SilhouetteError {
    #[error("unknown curve id: {0}")]
    UnknownCurve(String),
}

/// Result type alias for silhouette operations.
pub type Result<T> = std::result::Result<T, SilhouetteError>;
