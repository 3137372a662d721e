//! Core data model for volslice-rs.
//!
//! This crate provides volumes and their sampling, color mapping, overlays,
//! voxel identification, view state and configuration. It has no notion of a
//! rasterizer; see `volslice-render` for slice drawing.

// Type casts in geometry code: Conversions between voxel indices (i32/usize)
// and coordinates (f32) are intentional and values are bounded by volume dimensions.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints: Detailed error/panic docs will be added as the API stabilizes.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Method design: Some methods take &self for API consistency even when not using it.
#![allow(clippy::unused_self)]
// Float comparisons are exact where tests check constructed values.
#![allow(clippy::float_cmp)]
// Builder-style methods returning values are standard.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Variables like i, j, k are conventional for voxel indices.
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod bounding_box;
pub mod coloring;
pub mod error;
pub mod options;
pub mod overlay;
pub mod pick;
pub mod plane;
pub mod sampling;
pub mod view_state;
pub mod volume;

pub use bounding_box::BoundingBox;
pub use coloring::{
    color_indices_with_label_table, color_scalars_with_palette, color_values,
    convert_slice_coloring_to_outline_mode, ColorMapper, ColorMapping, Label, LabelTable, Palette,
    PaletteColorMapping, PaletteRegistry, PaletteScale, PaletteThreshold, ThresholdTest, VolumeStatistics,
};
pub use error::{Result, VolsliceError};
pub use options::{DepthOffset, LabelDrawingType, SliceDrawOptions};
pub use overlay::VolumeOverlay;
pub use pick::{
    color_to_index, index_to_color, FlatIndexCodec, IdentificationRecord, PickColorCodec, PixelReadback,
    SelectedVoxel, SelectionReadback, VoxelHit, VoxelIdentification, IDENTIFICATION_FIELDS_PER_VOXEL, MAX_PICK_ID,
};
pub use plane::Plane;
pub use sampling::{slice_values, MapCache, SamplingPolicy, SliceValues, VolumeSampler};
pub use view_state::{DrawMode, MontageSettings, PlaneAxes, ViewMode, ViewPlane, ViewState};
pub use volume::{CachedMapVolume, DenseVolume, InMemoryMapSource, MapSource, Volume, VolumeGeometry};

// Re-export glam types for convenience
pub use glam::{IVec3, Mat4, Vec2, Vec3, Vec4};
