//! Error types for volslice-rs.

use thiserror::Error;

/// The main error type for volslice-rs data and configuration operations.
#[derive(Error, Debug)]
pub enum VolsliceError {
    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Volume dimensions are unusable (zero voxels along an axis).
    #[error("invalid volume dimensions {0:?}")]
    InvalidDimensions([usize; 3]),

    /// The index-to-space transform cannot be inverted.
    #[error("volume '{0}' has a singular index-to-space transform")]
    SingularTransform(String),

    /// A map index does not exist in the volume.
    #[error("map index {map_index} out of range for volume '{volume}' with {num_maps} maps")]
    MapIndexOutOfRange {
        volume: String,
        map_index: usize,
        num_maps: usize,
    },

    /// Overlay opacity outside [0, 1].
    #[error("overlay opacity {0} is outside [0, 1]")]
    InvalidOpacity(f32),

    /// A palette referenced by a color mapping is not registered.
    #[error("missing palette named '{0}'")]
    MissingPalette(String),

    /// Fetching a whole map from a remote-backed volume failed.
    #[error("failed to fetch map {map_index} of volume '{volume}': {reason}")]
    MapFetchFailed {
        volume: String,
        map_index: usize,
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for volslice-rs operations.
pub type Result<T> = std::result::Result<T, VolsliceError>;
