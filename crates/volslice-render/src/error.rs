//! Slice drawing error types.
//!
//! None of these are fatal: the caller skips the affected view and draws the
//! next frame as usual.

use thiserror::Error;

/// Errors that abort drawing a single view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    /// The slice plane normal is degenerate.
    #[error("invalid slice plane")]
    InvalidPlane,

    /// An overlay has a voxel bounding box without extent.
    #[error("volume '{0}' has degenerate voxel bounds")]
    DegenerateVoxelBounds(String),

    /// An overlay has a non-positive voxel spacing.
    #[error("volume '{0}' has non-positive voxel spacing")]
    NonPositiveSpacing(String),

    /// There is nothing to draw.
    #[error("no overlays to draw")]
    NoOverlays,

    /// The viewport has no area.
    #[error("viewport {width}x{height} has no area")]
    EmptyViewport { width: i32, height: i32 },
}

/// A specialized Result type for slice drawing.
pub type DrawResult<T> = std::result::Result<T, DrawError>;
