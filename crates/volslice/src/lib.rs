//! volslice-rs: oblique and orthogonal volume slice drawing.
//!
//! Given a stack of voxel volumes drawn as overlays and a view state, volslice
//! resolves the slice plane and camera, samples and colors every overlay,
//! composites the layers and hands colored quads to a primitive sink. An
//! identification draw shares the same geometry and encodes a voxel record in
//! every quad color, so a pixel read back after the draw names the voxel under
//! the mouse.
//!
//! # Quick Start
//!
//! ```no_run
//! use volslice::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let geometry = VolumeGeometry::from_origin_and_spacing([4, 4, 4], Vec3::ZERO, Vec3::ONE)?;
//!     let volume: Volume = DenseVolume::new("anatomy", geometry, vec![vec![1.0; 64]])?.into();
//!     let overlay = VolumeOverlay::new(&volume, 0, ColorMapping::Palette(PaletteColorMapping::new("Gray_Interp")))?;
//!
//!     let palettes = PaletteRegistry::new();
//!     let mut session = SliceDrawSession::new(vec![overlay], &palettes, SliceDrawOptions::default())?;
//!     let mut sink = RecordingSink::new();
//!     session.draw(&ViewState::new(Vec3::ONE), Viewport::new(0, 0, 512, 512), DrawPurpose::Render, &mut sink);
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `volslice-core`: volumes, sampling, color mapping, overlays, identification, view state, options
//! - `volslice-render`: plane resolution, orthogonal and oblique rasterizers, compositing, layout

mod session;

pub use session::{DrawPurpose, SliceDrawSession};

// Re-export core types
pub use volslice_core::{
    BoundingBox, CachedMapVolume, ColorMapper, ColorMapping, DenseVolume, DepthOffset, DrawMode, FlatIndexCodec,
    IdentificationRecord, InMemoryMapSource, Label, LabelDrawingType, LabelTable, MapCache, MapSource,
    MontageSettings, Palette, PaletteColorMapping, PaletteRegistry, PaletteScale, PaletteThreshold, PickColorCodec,
    PixelReadback, Plane, SamplingPolicy, SelectedVoxel, SelectionReadback, SliceDrawOptions, ThresholdTest,
    ViewMode, ViewPlane, ViewState, Volume, VolumeGeometry, VolumeOverlay, VolumeStatistics, VolsliceError,
    VoxelHit, VoxelIdentification,
};

// Re-export render types
pub use volslice_render::{
    DrawError, DrawResult, LineBatch, OutlineSurface, PrimitiveSink, QuadBatch, RecordedView, RecordingSink,
    SliceFrame, TextLabel, ViewSetup, Viewport,
};

// Re-export glam types for convenience
pub use glam::{IVec3, Mat4, Vec2, Vec3, Vec4};

/// Initializes logging from the `RUST_LOG` environment variable.
///
/// Safe to call more than once; later calls do nothing.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
